use crate::error::MalformedRecord;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Number, Value};
use strum::EnumString;

pub const ACCEPTED: &str = "Accepted";

/// Extension used for languages outside the lookup table.
pub const DEFAULT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub title: String,
    /// Lower-cased language name as reported by the platform.
    pub language: String,
    pub status: String,
    pub timestamp: Option<i64>,
    pub code: Option<String>,
    pub runtime: Option<String>,
    pub memory: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    #[strum(serialize = "python", serialize = "python3")]
    Python,
    #[strum(serialize = "java")]
    Java,
    #[strum(serialize = "cpp")]
    Cpp,
    #[strum(serialize = "javascript")]
    JavaScript,
    #[strum(serialize = "typescript")]
    TypeScript,
    #[default]
    #[strum(disabled)]
    Other,
}

impl Language {
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Other => DEFAULT_EXTENSION,
        }
    }

    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Language::Python | Language::Other => "#",
            _ => "//",
        }
    }
}

/// Strings or numbers, whichever the endpoint decided to send today.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Number(number) => number.to_string(),
        }
    }

    fn as_epoch_seconds(&self) -> Option<i64> {
        match self {
            Scalar::Text(text) => text.trim().parse().ok(),
            Scalar::Number(number) => number.as_i64(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmission {
    title: Option<String>,
    #[serde(alias = "language")]
    lang: Option<String>,
    #[serde(alias = "status_display")]
    status_display: Option<String>,
    timestamp: Option<Scalar>,
    code: Option<String>,
    runtime: Option<Scalar>,
    memory: Option<Scalar>,
    difficulty: Option<String>,
}

impl Submission {
    /// Builds a submission from one raw record of the response.
    ///
    /// `title` and `language` must be present and non-blank, everything else
    /// falls back to a default.
    pub fn from_raw(index: usize, raw: &Value) -> Result<Self, MalformedRecord> {
        let raw = RawSubmission::deserialize(raw).map_err(|e| MalformedRecord {
            index,
            reason: e.to_string(),
        })?;

        let title = required(index, "title", raw.title)?;
        let language = required(index, "language", raw.lang)?.to_lowercase();

        Ok(Self {
            title,
            language,
            status: raw.status_display.unwrap_or_default(),
            timestamp: raw.timestamp.as_ref().and_then(Scalar::as_epoch_seconds),
            code: raw.code,
            runtime: raw.runtime.map(Scalar::into_string),
            memory: raw.memory.map(Scalar::into_string),
            difficulty: raw.difficulty,
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED
    }

    pub fn lang(&self) -> Language {
        Language::from_name(&self.language)
    }

    /// `"Two Sum"` in javascript becomes `two_sum.js`.
    pub fn file_name(&self) -> String {
        let stem = self
            .title
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect::<String>()
            .to_lowercase();
        format!("{}.{}", stem, self.lang().extension())
    }

    pub fn submitted_at(&self) -> Option<String> {
        self.timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }
}

fn required(index: usize, field: &str, value: Option<String>) -> Result<String, MalformedRecord> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(_) => Err(MalformedRecord {
            index,
            reason: format!("field `{}` is blank", field),
        }),
        None => Err(MalformedRecord {
            index,
            reason: format!("field `{}` is missing", field),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_raw_should_accept_camel_case_fields() {
        let raw = json!({
            "title": "Two Sum",
            "lang": "JavaScript",
            "statusDisplay": "Accepted",
            "timestamp": "1700000000",
            "runtime": "52 ms",
            "memory": 42.1,
        });
        let submission = Submission::from_raw(0, &raw).unwrap();

        assert_eq!(submission.title, "Two Sum");
        assert_eq!(submission.language, "javascript");
        assert!(submission.is_accepted());
        assert_eq!(submission.timestamp, Some(1_700_000_000));
        assert_eq!(submission.runtime.as_deref(), Some("52 ms"));
        assert_eq!(submission.memory.as_deref(), Some("42.1"));
        assert_eq!(submission.code, None);
        assert_eq!(submission.difficulty, None);
    }

    #[test]
    fn from_raw_should_accept_snake_case_status() {
        let raw = json!({
            "title": "Add Two Numbers",
            "language": "cpp",
            "status_display": "Wrong Answer",
            "timestamp": 1700000000,
        });
        let submission = Submission::from_raw(3, &raw).unwrap();

        assert_eq!(submission.status, "Wrong Answer");
        assert!(!submission.is_accepted());
    }

    #[test]
    fn from_raw_should_reject_missing_or_blank_required_fields() {
        let missing_title = json!({ "lang": "java", "statusDisplay": "Accepted" });
        let err = Submission::from_raw(1, &missing_title).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(err.reason.contains("title"));

        let blank_language = json!({ "title": "Two Sum", "lang": "  " });
        let err = Submission::from_raw(2, &blank_language).unwrap_err();
        assert!(err.reason.contains("language"));

        let wrong_type = json!({ "title": 42, "lang": "java" });
        assert!(Submission::from_raw(4, &wrong_type).is_err());
    }

    #[test]
    fn status_match_should_be_case_sensitive() {
        let raw = json!({ "title": "Two Sum", "lang": "java", "statusDisplay": "accepted" });
        assert!(!Submission::from_raw(0, &raw).unwrap().is_accepted());
    }

    #[test]
    fn file_name_should_be_lower_snake_case_with_extension() {
        let cases = [
            ("Two Sum", "javascript", "two_sum.js"),
            ("Valid  Parentheses", "python3", "valid__parentheses.py"),
            ("LRU Cache", "java", "lru_cache.java"),
            ("Merge Intervals", "cpp", "merge_intervals.cpp"),
            ("Climbing Stairs", "typescript", "climbing_stairs.ts"),
            ("Reverse String", "rust", "reverse_string.txt"),
        ];
        for (title, lang, expected) in cases {
            let raw = json!({ "title": title, "lang": lang });
            let submission = Submission::from_raw(0, &raw).unwrap();
            assert_eq!(submission.file_name(), expected);
        }
    }

    #[test]
    fn language_lookup_should_fall_back_to_other() {
        assert_eq!(Language::from_name("python"), Language::Python);
        assert_eq!(Language::from_name("Python3"), Language::Python);
        assert_eq!(Language::from_name("golang"), Language::Other);
        assert_eq!(Language::from_name("other"), Language::Other);
        assert_eq!(Language::Other.extension(), DEFAULT_EXTENSION);
    }

    #[test]
    fn submitted_at_should_format_utc() {
        let raw = json!({ "title": "Two Sum", "lang": "java", "timestamp": 0 });
        let submission = Submission::from_raw(0, &raw).unwrap();
        assert_eq!(
            submission.submitted_at().as_deref(),
            Some("1970-01-01 00:00:00 UTC")
        );

        let raw = json!({ "title": "Two Sum", "lang": "java", "timestamp": "soon" });
        assert_eq!(Submission::from_raw(0, &raw).unwrap().submitted_at(), None);
    }
}
