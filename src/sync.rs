use crate::{
    config::{StatusFilter, SyncConfig},
    error::{PersistError, SyncError},
    render::SolutionFile,
    source::SubmissionSource,
    submission::Submission,
};
use serde_json::Value;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tokio::fs;

const RAW_DUMP_DIR: &str = "stats";
const STATS_DUMP_FILE: &str = "leetcode_data.json";
const RECORDS_DUMP_FILE: &str = "submissions.json";

/// Outcome of one run that got past the fetch step.
#[derive(Debug, Default)]
pub struct SyncResult {
    pub fetched: usize,
    /// Records dropped because `title` or `language` was unusable.
    pub malformed: usize,
    pub filtered_out: usize,
    pub written: Vec<PathBuf>,
    pub failures: Vec<PersistFailure>,
}

#[derive(Debug)]
pub struct PersistFailure {
    pub title: String,
    pub language: String,
    pub error: PersistError,
}

impl SyncResult {
    /// Records that passed the status filter, written or not.
    pub fn retained(&self) -> usize {
        self.written.len() + self.failures.len()
    }

    /// An empty fetch is a failure, so is a fetch where every record was
    /// malformed, and so is writing nothing out of a non-empty retained set.
    /// Individual write failures are not.
    pub fn is_success(&self) -> bool {
        self.fetched > 0
            && self.malformed < self.fetched
            && (self.retained() == 0 || !self.written.is_empty())
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched: {}, malformed: {}, filtered out: {}, written: {}, failed: {}",
            self.fetched,
            self.malformed,
            self.filtered_out,
            self.written.len(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}", failure)?;
        }
        Ok(())
    }
}

impl fmt::Display for PersistFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.language, self.error)
    }
}

/// Fetches the submissions of the configured account and archives them under
/// `config.output_root`.
///
/// Nothing touches the disk unless the fetch succeeded. After that every
/// record is handled on its own: a bad record or a failed write is reported
/// in the result and the batch carries on.
pub async fn run<S>(config: &SyncConfig, source: &S) -> Result<SyncResult, SyncError>
where
    S: SubmissionSource + Sync + ?Sized,
{
    let account = non_blank(config.account_identifier.as_deref()).ok_or(
        SyncError::MissingConfiguration("account identifier (LEETCODE_USERNAME)"),
    )?;
    let credential = non_blank(config.session_credential.as_deref());
    if credential.is_none() {
        if source.requires_credential() {
            return Err(SyncError::MissingConfiguration(
                "session credential (LEETCODE_SESSION)",
            ));
        }
        tracing::warn!("No session credential configured, only public submissions are visible");
    }

    let records = source.fetch(account, credential).await?;
    let mut result = SyncResult {
        fetched: records.len(),
        ..Default::default()
    };

    if config.dump_raw {
        dump_raw(&config.output_root, source, account, credential, &records).await;
    }

    let submissions = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match Submission::from_raw(index, raw) {
            Ok(submission) => Some(submission),
            Err(e) => {
                tracing::warn!("{}", e);
                result.malformed += 1;
                None
            }
        })
        .collect::<Vec<_>>();

    for submission in submissions {
        if config.status_filter == StatusFilter::AcceptedOnly && !submission.is_accepted() {
            tracing::debug!(
                "Skip {} ({}) with status {:?}",
                submission.title,
                submission.language,
                submission.status
            );
            result.filtered_out += 1;
            continue;
        }

        match persist(&config.output_root, &submission).await {
            Ok(path) => {
                tracing::info!("Saved {} to {}", submission.title, path.display());
                result.written.push(path);
            }
            Err(error) => {
                tracing::error!(
                    "Failed to save {} ({}): {}",
                    submission.title,
                    submission.language,
                    error
                );
                result.failures.push(PersistFailure {
                    title: submission.title,
                    language: submission.language,
                    error,
                });
            }
        }
    }

    tracing::info!("Sync finished: {}", result);
    Ok(result)
}

/// Writes one submission to `<root>/<language>/<file name>`, replacing any
/// file already there.
pub async fn persist(root: &Path, submission: &Submission) -> Result<PathBuf, PersistError> {
    let dir = root.join(path_component(&submission.language)?);
    let file_name = submission.file_name();
    let path = dir.join(path_component(&file_name)?);
    let content = SolutionFile::new(submission).generate()?;

    fs::create_dir_all(&dir)
        .await
        .map_err(|source| PersistError::Io {
            path: dir.clone(),
            source,
        })?;
    fs::write(&path, content)
        .await
        .map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

/// Writes the profile statistics response and the raw record array under
/// `<root>/stats/`. Only called once the submission fetch has been validated;
/// nothing here affects the run result.
async fn dump_raw<S>(
    root: &Path,
    source: &S,
    account: &str,
    credential: Option<&str>,
    records: &[Value],
) where
    S: SubmissionSource + Sync + ?Sized,
{
    let dir = root.join(RAW_DUMP_DIR);

    match source.fetch_stats(account, credential).await {
        Ok(Some(stats)) => write_json(&dir, STATS_DUMP_FILE, &stats).await,
        Ok(None) => tracing::debug!("Source has no statistics to dump"),
        Err(e) => tracing::warn!("Failed to fetch statistics: {}", e),
    }
    write_json(&dir, RECORDS_DUMP_FILE, records).await;
}

async fn write_json<T>(dir: &Path, file_name: &str, value: &T)
where
    T: serde::Serialize + ?Sized,
{
    let path = dir.join(file_name);
    let write = async {
        let json = serde_json::to_vec_pretty(value)?;
        fs::create_dir_all(dir).await?;
        fs::write(&path, json).await?;
        Ok::<_, anyhow::Error>(())
    };

    match write.await {
        Ok(()) => tracing::info!("Dumped {}", path.display()),
        Err(e) => tracing::warn!("Failed to dump {}: {}", path.display(), e),
    }
}

fn path_component(name: &str) -> Result<&str, PersistError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(PersistError::InvalidPath(name.to_string()));
    }
    Ok(name)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
