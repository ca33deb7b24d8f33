use crate::{error::PersistError, submission::Submission};
use askama::Template;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Template)]
#[template(path = "submission.txt.j2", escape = "none")]
pub struct SolutionFile<'a> {
    pub comment: &'a str,
    pub title: &'a str,
    pub status: &'a str,
    pub language: &'a str,
    pub difficulty: &'a str,
    pub runtime: &'a str,
    pub memory: &'a str,
    pub submitted_at: String,
    pub code: String,
}

impl<'a> SolutionFile<'a> {
    pub fn new(submission: &'a Submission) -> Self {
        let comment = submission.lang().comment_prefix();
        let code = match &submission.code {
            Some(code) => code.clone(),
            None => placeholder(comment),
        };

        Self {
            comment,
            title: &submission.title,
            status: or_na(Some(&submission.status).filter(|s| !s.is_empty())),
            language: &submission.language,
            difficulty: or_na(submission.difficulty.as_ref()),
            runtime: or_na(submission.runtime.as_ref()),
            memory: or_na(submission.memory.as_ref()),
            submitted_at: submission
                .submitted_at()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            code,
        }
    }

    /// Rendered file content, ending with a newline.
    pub fn generate(&self) -> Result<String, PersistError> {
        let mut content = self.render()?;
        if !content.ends_with('\n') {
            content.push('\n');
        }
        Ok(content)
    }
}

pub fn placeholder(comment: &str) -> String {
    format!("{} Source code not available for this submission.", comment)
}

fn or_na(value: Option<&String>) -> &str {
    value.map(String::as_str).unwrap_or(NOT_AVAILABLE)
}
