use crate::source::{
    GraphqlOptions, GraphqlOptionsBuilder, QueryShape, QueryVariant, DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT_SECS,
};
use anyhow::{Context, Result};
use clap::Args;
use derive_builder::Builder;
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_OUTPUT_DIR: &str = "solutions";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Keep only submissions whose status is exactly "Accepted".
    #[default]
    AcceptedOnly,
    /// Keep every submission regardless of status.
    All,
}

/// Everything one sync run needs, passed explicitly into [`crate::run`].
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct SyncConfig {
    #[builder(default, setter(into, strip_option))]
    pub account_identifier: Option<String>,
    #[builder(default, setter(into, strip_option))]
    pub session_credential: Option<String>,
    #[builder(default = "PathBuf::from(DEFAULT_OUTPUT_DIR)")]
    pub output_root: PathBuf,
    #[builder(default)]
    pub status_filter: StatusFilter,
    /// Also dump profile statistics and the raw records under `stats/`.
    #[builder(default)]
    pub dump_raw: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Account whose submissions are archived
    #[arg(long, env = "LEETCODE_USERNAME")]
    pub username: Option<String>,

    /// Value of the LEETCODE_SESSION cookie
    #[arg(long, env = "LEETCODE_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Directory the solutions are written to
    #[arg(short, long, env = "LEETCODE_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// GraphQL endpoint to query
    #[arg(long, env = "LEETCODE_GRAPHQL_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    #[arg(long, value_enum, default_value_t = QueryVariant::Recent)]
    pub query: QueryVariant,

    /// Read the query text from this file instead
    #[arg(long)]
    pub query_file: Option<PathBuf>,

    /// JSON pointer to the record array in the response
    #[arg(long)]
    pub records_pointer: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retry a failed request once after this many milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Archive every submission, not only accepted ones
    #[arg(long)]
    pub all_statuses: bool,

    /// Dump profile statistics and raw records to <output>/stats/
    #[arg(long)]
    pub dump_raw: bool,
}

impl SyncArgs {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            account_identifier: self.username.clone(),
            session_credential: self.session.clone(),
            output_root: self.output.clone(),
            status_filter: if self.all_statuses {
                StatusFilter::All
            } else {
                StatusFilter::AcceptedOnly
            },
            dump_raw: self.dump_raw,
        }
    }

    pub fn graphql_options(&self) -> Result<GraphqlOptions> {
        let mut shape = QueryShape::from(self.query);
        if let Some(path) = &self.query_file {
            shape.query = fs::read_to_string(path)
                .with_context(|| format!("failed to read query file {}", path.display()))?;
        }
        if let Some(pointer) = &self.records_pointer {
            shape.records_pointer = pointer.clone();
        }

        let mut builder = GraphqlOptionsBuilder::default();
        builder
            .endpoint(self.endpoint.clone())
            .shape(shape)
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ms) = self.retry_delay_ms {
            builder.retry_delay(Duration::from_millis(ms));
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        args: SyncArgs,
    }

    #[test]
    fn builder_should_fill_defaults() {
        let config = SyncConfigBuilder::default()
            .account_identifier("alice")
            .build()
            .unwrap();

        assert_eq!(config.account_identifier.as_deref(), Some("alice"));
        assert_eq!(config.session_credential, None);
        assert_eq!(config.output_root, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.status_filter, StatusFilter::AcceptedOnly);
        assert!(!config.dump_raw);
    }

    #[test]
    fn args_should_map_to_config_and_options() {
        let cli = Cli::try_parse_from([
            "leetcode-sync",
            "--username",
            "alice",
            "--output",
            "archive",
            "--query",
            "authenticated",
            "--records-pointer",
            "/data/list",
            "--timeout-secs",
            "3",
            "--retry-delay-ms",
            "250",
            "--all-statuses",
        ])
        .unwrap();

        let config = cli.args.sync_config();
        assert_eq!(config.account_identifier.as_deref(), Some("alice"));
        assert_eq!(config.output_root, PathBuf::from("archive"));
        assert_eq!(config.status_filter, StatusFilter::All);

        let options = cli.args.graphql_options().unwrap();
        assert!(options.shape.requires_credential);
        assert_eq!(options.shape.records_pointer, "/data/list");
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.retry_delay, Some(Duration::from_millis(250)));
    }

    #[test]
    fn query_file_should_replace_query_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "query custom($username: String!) {{ x }}").unwrap();

        let cli = Cli::try_parse_from([
            "leetcode-sync",
            "--query-file",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        let options = cli.args.graphql_options().unwrap();

        assert_eq!(options.shape.query, "query custom($username: String!) { x }");
        assert_eq!(options.shape.records_pointer, "/data/recentSubmissionList");
    }
}
