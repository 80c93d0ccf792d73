mod from;

use std::{fmt::Display, path::PathBuf};

use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("prefix `{0}` is invalid")]
    InvalidPrefix(String),

    #[error("no buckets given")]
    EmptyBucketList,

    #[error("no objects found in any bucket with prefix `{0}`")]
    NoObjectsFound(String),

    #[error("path is empty")]
    EmptyPath,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("manifest record on line {line} is invalid: `{record}`")]
    InvalidManifestRecord { line: usize, record: String },

    #[error("no item found for `s3://{bucket}/{key}`")]
    ItemNotFound { bucket: String, key: String },

    #[error("`s3://{bucket}/{key}` has no ETag")]
    MissingETag { bucket: String, key: String },

    #[error("manifest `s3://{bucket}/{key}` does not exist or is not accessible")]
    ManifestMissing { bucket: String, key: String },

    #[error("failed to resolve ETag of manifest `s3://{bucket}/{key}`: {reason}")]
    ETagResolutionFailed {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("manifest rejected by batch service: {0}")]
    InvalidManifest(String),

    #[error("caller identity has no account ID")]
    MissingAccountId,

    #[error("batch service returned no job ID")]
    MissingJobId,

    #[error("job {job_id} failed: {}", format_reasons(.reasons))]
    JobFailed {
        job_id: String,
        reasons: Vec<String>,
    },

    #[error("job {job_id} was not ready to start after {attempts} attempts")]
    JobNotReady { job_id: String, attempts: usize },

    #[error("job {job_id} has status {status}, expected it to be ready to start")]
    UnexpectedJobStatus { job_id: String, status: String },

    #[error("key `{0}` does not map to a path under the destination")]
    InvalidKey(String),

    #[error("directory `{0}` does not exist")]
    DirectoryDoesNotExist(PathBuf),

    #[error("operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(AnyError),
}

#[derive(Error, Debug)]
pub struct AnyError(anyhow::Error);

impl Display for AnyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for AnyError {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl Error {
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(AnyError(error.into()))
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Other(AnyError(error))
    }
}

fn format_reasons(reasons: &[String]) -> String {
    if reasons.is_empty() {
        "no reason given".to_owned()
    } else {
        reasons.iter().join("; ")
    }
}
