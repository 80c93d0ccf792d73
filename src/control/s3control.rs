use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3control::{
    error::ProvideErrorMetadata,
    types::{
        JobManifest, JobManifestFieldName, JobManifestFormat, JobManifestLocation,
        JobManifestSpec, JobOperation, JobReport, JobReportFormat, JobReportScope,
        JobStatus as S3JobStatus, RequestedJobStatus, S3GlacierJobTier,
        S3InitiateRestoreObjectOperation,
    },
    Client,
};
use log::debug;

use crate::{
    error::{Error, Result},
    request::RetrievalTier,
};

use super::{BatchJobs, JobDescription, JobProgress, JobStatus, RestoreJobSpec};

const INVALID_MANIFEST_CODE: &str = "InvalidManifest";

#[derive(Debug, Clone)]
pub struct S3ControlJobs {
    client: Client,
}

impl S3ControlJobs {
    pub fn new(config: &SdkConfig) -> Self {
        S3ControlJobs {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl BatchJobs for S3ControlJobs {
    async fn create_restore_job(&self, account_id: &str, spec: &RestoreJobSpec) -> Result<String> {
        let manifest_spec = JobManifestSpec::builder()
            .format(JobManifestFormat::S3BatchOperationsCsv20180820)
            .fields(JobManifestFieldName::Bucket)
            .fields(JobManifestFieldName::Key)
            .build()?;
        let manifest_location = JobManifestLocation::builder()
            .object_arn(&spec.manifest_arn)
            .e_tag(&spec.manifest_e_tag)
            .build()?;
        let manifest = JobManifest::builder()
            .spec(manifest_spec)
            .location(manifest_location)
            .build();

        let restore = S3InitiateRestoreObjectOperation::builder()
            .expiration_in_days(spec.expiration_days)
            .glacier_job_tier(glacier_job_tier(spec.tier))
            .build();
        let operation = JobOperation::builder()
            .s3_initiate_restore_object(restore)
            .build();

        let report = JobReport::builder()
            .enabled(true)
            .bucket(&spec.report_bucket_arn)
            .prefix(&spec.report_prefix)
            .format(JobReportFormat::ReportCsv20180820)
            .report_scope(JobReportScope::AllTasks)
            .build();

        let response = self
            .client
            .create_job()
            .account_id(account_id)
            .confirmation_required(true)
            .manifest(manifest)
            .operation(operation)
            .report(report)
            .priority(spec.priority)
            .role_arn(&spec.role_arn)
            .client_request_token(&spec.client_request_token)
            .send()
            .await
            .map_err(|err| {
                if err.code() == Some(INVALID_MANIFEST_CODE) {
                    let message = err.message().unwrap_or(INVALID_MANIFEST_CODE).to_owned();
                    Error::InvalidManifest(message)
                } else {
                    Error::from(err)
                }
            })?;

        let job_id = response.job_id().ok_or(Error::MissingJobId)?;
        Ok(job_id.to_owned())
    }

    async fn describe_job(&self, account_id: &str, job_id: &str) -> Result<JobDescription> {
        let response = self
            .client
            .describe_job()
            .account_id(account_id)
            .job_id(job_id)
            .send()
            .await?;

        let Some(job) = response.job() else {
            return Ok(JobDescription {
                status: JobStatus::Unknown,
                failure_reasons: vec![],
                progress: None,
            });
        };

        let status = job.status().map_or(JobStatus::Unknown, job_status);
        let failure_reasons = job
            .failure_reasons()
            .iter()
            .map(|failure| {
                format!(
                    "{}: {}",
                    failure.failure_code().unwrap_or("unknown"),
                    failure.failure_reason().unwrap_or("no reason given")
                )
            })
            .collect();
        let progress = job.progress_summary().map(|summary| JobProgress {
            total: summary.total_number_of_tasks().unwrap_or(0),
            succeeded: summary.number_of_tasks_succeeded().unwrap_or(0),
            failed: summary.number_of_tasks_failed().unwrap_or(0),
        });

        debug!("job {job_id} has status {status}");
        Ok(JobDescription {
            status,
            failure_reasons,
            progress,
        })
    }

    async fn start_job(&self, account_id: &str, job_id: &str) -> Result<()> {
        self.client
            .update_job_status()
            .account_id(account_id)
            .job_id(job_id)
            .requested_job_status(RequestedJobStatus::Ready)
            .send()
            .await?;
        Ok(())
    }
}

fn glacier_job_tier(tier: RetrievalTier) -> S3GlacierJobTier {
    match tier {
        RetrievalTier::Standard => S3GlacierJobTier::Standard,
        RetrievalTier::Bulk => S3GlacierJobTier::Bulk,
    }
}

fn job_status(status: &S3JobStatus) -> JobStatus {
    match status {
        S3JobStatus::New => JobStatus::New,
        S3JobStatus::Preparing => JobStatus::Preparing,
        S3JobStatus::Suspended => JobStatus::Suspended,
        S3JobStatus::Ready => JobStatus::Ready,
        S3JobStatus::Active => JobStatus::Active,
        S3JobStatus::Pausing => JobStatus::Pausing,
        S3JobStatus::Paused => JobStatus::Paused,
        S3JobStatus::Completing => JobStatus::Completing,
        S3JobStatus::Complete => JobStatus::Complete,
        S3JobStatus::Failing => JobStatus::Failing,
        S3JobStatus::Failed => JobStatus::Failed,
        S3JobStatus::Cancelling => JobStatus::Cancelling,
        S3JobStatus::Cancelled => JobStatus::Cancelled,
        _ => JobStatus::Unknown,
    }
}
