use crate::error::{FetchError, GraphQlErrors};
use async_trait::async_trait;
use clap::ValueEnum;
use derive_builder::Builder;
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER, USER_AGENT},
    Client, Url,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use strum::Display;

pub const DEFAULT_ENDPOINT: &str = "https://leetcode.com/graphql";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const EXCERPT_LEN: usize = 200;

const RECENT_QUERY: &str = r#"
query recentSubmissions($username: String!) {
  recentSubmissionList(username: $username) {
    title
    titleSlug
    timestamp
    statusDisplay
    lang
  }
}
"#;

const AUTHENTICATED_QUERY: &str = r#"
query submissions($username: String!) {
  matchedUser(username: $username) {
    username
  }
  submissionList(offset: 0, limit: 20) {
    submissions {
      title
      statusDisplay
      lang
      timestamp
      runtime
      memory
      code
    }
  }
}
"#;

const STATS_QUERY: &str = r#"
query userStats($username: String!) {
  matchedUser(username: $username) {
    submitStats {
      acSubmissionNum {
        difficulty
        count
        submissions
      }
    }
    submissionCalendar
    submitStatsGlobal {
      acSubmissionNum {
        difficulty
        count
      }
    }
  }
}
"#;
const STATS_POINTER: &str = "/data/matchedUser";

/// Anything that can hand over the raw submission records of one account.
#[async_trait]
pub trait SubmissionSource {
    async fn fetch(&self, account: &str, credential: Option<&str>)
        -> Result<Vec<Value>, FetchError>;

    /// Full profile statistics response, for sources that have one.
    async fn fetch_stats(
        &self,
        _account: &str,
        _credential: Option<&str>,
    ) -> Result<Option<Value>, FetchError> {
        Ok(None)
    }

    /// Whether `fetch` is pointless without a session credential.
    fn requires_credential(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryVariant {
    /// Public recent submission list, no source code.
    #[default]
    Recent,
    /// Submission list with source code, needs a session cookie.
    Authenticated,
}

/// The query text and where the record array lives in its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryShape {
    pub query: String,
    /// JSON pointer, e.g. `/data/recentSubmissionList`.
    pub records_pointer: String,
    pub requires_credential: bool,
}

impl From<QueryVariant> for QueryShape {
    fn from(variant: QueryVariant) -> Self {
        match variant {
            QueryVariant::Recent => Self {
                query: RECENT_QUERY.to_string(),
                records_pointer: "/data/recentSubmissionList".to_string(),
                requires_credential: false,
            },
            QueryVariant::Authenticated => Self {
                query: AUTHENTICATED_QUERY.to_string(),
                records_pointer: "/data/submissionList/submissions".to_string(),
                requires_credential: true,
            },
        }
    }
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct GraphqlOptions {
    #[builder(default = "DEFAULT_ENDPOINT.to_string()")]
    pub endpoint: String,
    #[builder(default)]
    pub shape: QueryShape,
    #[builder(default = "Duration::from_secs(DEFAULT_TIMEOUT_SECS)")]
    pub timeout: Duration,
    /// One retry after this delay on transport or status failures.
    #[builder(default, setter(into, strip_option))]
    pub retry_delay: Option<Duration>,
}

impl Default for QueryShape {
    fn default() -> Self {
        QueryVariant::default().into()
    }
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

pub struct GraphqlSource {
    options: GraphqlOptions,
    client: Client,
}

impl GraphqlSource {
    pub fn new(options: GraphqlOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        if let Some(origin) = origin_of(&options.endpoint) {
            if let Ok(value) = HeaderValue::from_str(&origin) {
                headers.insert(ORIGIN, value.clone());
                headers.insert(REFERER, value);
            }
        }

        let client = Client::builder()
            .gzip(true)
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { options, client })
    }

    async fn send(
        &self,
        query: &str,
        account: &str,
        credential: Option<&str>,
    ) -> Result<Value, FetchError> {
        let body = GraphqlRequest {
            query,
            variables: json!({ "username": account }),
        };

        let mut request = self.client.post(&self.options.endpoint).json(&body);
        if let Some(credential) = credential {
            request = request.header(COOKIE, format!("LEETCODE_SESSION={}", credential));
        }

        let transport = |source: reqwest::Error| FetchError::Transport {
            endpoint: self.options.endpoint.clone(),
            source,
        };
        let res = request.send().await.map_err(transport)?;
        let status = res.status();
        let text = res.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                excerpt: excerpt(&text),
            });
        }

        serde_json::from_str(&text).map_err(FetchError::Decode)
    }

    async fn send_with_retry(
        &self,
        query: &str,
        account: &str,
        credential: Option<&str>,
    ) -> Result<Value, FetchError> {
        match (
            self.send(query, account, credential).await,
            self.options.retry_delay,
        ) {
            (Err(e), Some(delay)) if e.is_retryable() => {
                tracing::warn!("{}, retrying once in {:?}", e, delay);
                tokio::time::sleep(delay).await;
                self.send(query, account, credential).await
            }
            (result, _) => result,
        }
    }
}

#[async_trait]
impl SubmissionSource for GraphqlSource {
    async fn fetch(
        &self,
        account: &str,
        credential: Option<&str>,
    ) -> Result<Vec<Value>, FetchError> {
        tracing::info!(
            "Querying {} for submissions of {}",
            self.options.endpoint,
            account
        );

        let body = self
            .send_with_retry(&self.options.shape.query, account, credential)
            .await?;
        let records = extract_records(&body, &self.options.shape.records_pointer)?;
        tracing::info!("{} records received", records.len());

        Ok(records)
    }

    async fn fetch_stats(
        &self,
        account: &str,
        credential: Option<&str>,
    ) -> Result<Option<Value>, FetchError> {
        tracing::info!("Querying profile statistics of {}", account);

        let body = self.send_with_retry(STATS_QUERY, account, credential).await?;
        check_errors(&body)?;
        match body.pointer(STATS_POINTER) {
            Some(Value::Object(_)) => Ok(Some(body)),
            _ => Err(FetchError::UnexpectedShape(format!(
                "{} missing from statistics response: {}",
                STATS_POINTER,
                excerpt(&body.to_string())
            ))),
        }
    }

    fn requires_credential(&self) -> bool {
        self.options.shape.requires_credential
    }
}

/// Validates a decoded response body and pulls out the record array.
///
/// A non-empty `errors` array fails the whole response even when `data` is
/// partially filled in.
pub fn extract_records(body: &Value, pointer: &str) -> Result<Vec<Value>, FetchError> {
    check_errors(body)?;

    match body.pointer(pointer) {
        Some(Value::Array(records)) => Ok(records.clone()),
        Some(Value::Null) => Err(FetchError::UnexpectedShape(format!(
            "{} is null, is the account name correct?",
            pointer
        ))),
        Some(other) => Err(FetchError::UnexpectedShape(format!(
            "{} is not an array: {}",
            pointer,
            excerpt(&other.to_string())
        ))),
        None => Err(FetchError::UnexpectedShape(format!(
            "{} not found in response: {}",
            pointer,
            excerpt(&body.to_string())
        ))),
    }
}

fn check_errors(body: &Value) -> Result<(), FetchError> {
    match body.get("errors") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(errors)) if errors.is_empty() => Ok(()),
        Some(Value::Array(errors)) => Err(FetchError::GraphQl(GraphQlErrors(errors.clone()))),
        Some(other) => Err(FetchError::GraphQl(GraphQlErrors(vec![other.clone()]))),
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn origin_of(endpoint: &str) -> Option<String> {
    let origin = Url::parse(endpoint).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
