//! Batch-job and identity services that sit beside object storage.

mod s3control;
mod sts;

use std::{fmt, fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{error::Result, request::RetrievalTier};

pub use {s3control::S3ControlJobs, sts::StsIdentity};

pub type SharedJobs = Arc<dyn BatchJobs>;
pub type SharedIdentity = Arc<dyn AccountResolver>;

/// Lifecycle of a remote batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    New,
    Preparing,
    /// Prepared and waiting for confirmation before it can run.
    Suspended,
    Ready,
    Active,
    Pausing,
    Paused,
    Completing,
    Complete,
    Failing,
    Failed,
    Cancelling,
    Cancelled,
    Unknown,
}

impl JobStatus {
    pub fn is_ready_to_start(self) -> bool {
        self == JobStatus::Suspended
    }

    pub fn is_failed(self) -> bool {
        matches!(
            self,
            JobStatus::Failing | JobStatus::Failed | JobStatus::Cancelling | JobStatus::Cancelled
        )
    }

    /// Already past confirmation, so there's nothing left to start.
    pub fn is_started(self) -> bool {
        matches!(
            self,
            JobStatus::Ready | JobStatus::Active | JobStatus::Completing | JobStatus::Complete
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub total: i64,
    pub succeeded: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub status: JobStatus,
    pub failure_reasons: Vec<String>,
    pub progress: Option<JobProgress>,
}

/// Everything needed to submit a bulk restore job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreJobSpec {
    pub manifest_arn: String,
    pub manifest_e_tag: String,
    pub tier: RetrievalTier,
    pub expiration_days: i32,
    pub report_bucket_arn: String,
    pub report_prefix: String,
    pub role_arn: String,
    pub priority: i32,
    pub client_request_token: String,
}

#[async_trait]
pub trait BatchJobs: Debug + Send + Sync {
    /// Fails with `Error::InvalidManifest` when the service rejects the manifest location or tag.
    async fn create_restore_job(&self, account_id: &str, spec: &RestoreJobSpec) -> Result<String>;
    async fn describe_job(&self, account_id: &str, job_id: &str) -> Result<JobDescription>;
    async fn start_job(&self, account_id: &str, job_id: &str) -> Result<()>;
}

#[async_trait]
pub trait AccountResolver: Debug + Send + Sync {
    async fn account_id(&self) -> Result<String>;
}
