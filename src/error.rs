use reqwest::StatusCode;
use serde_json::Value;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Errors that abort a whole sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing configuration: {0} must be set")]
    MissingConfiguration(&'static str),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server answered {status}: {excerpt}")]
    Status { status: StatusCode, excerpt: String },

    #[error("query rejected: {0}")]
    GraphQl(GraphQlErrors),

    #[error("response body is not valid json: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl FetchError {
    /// Whether a second attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Status { .. })
    }
}

/// The `errors` array a GraphQL endpoint embeds in an otherwise successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlErrors(pub Vec<Value>);

impl fmt::Display for GraphQlErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self
            .0
            .iter()
            .map(|error| match error.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => error.to_string(),
            })
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join("; "))
    }
}

/// A fetched record that can't become a [`Submission`](crate::Submission).
#[derive(Debug, Error)]
#[error("record #{index} dropped: {reason}")]
pub struct MalformedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid path component {0:?}")]
    InvalidPath(String),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template: {0}")]
    Render(#[from] askama::Error),
}
