use log::{debug, info, warn};
use tokio::fs;
use tokio_retry2::{Retry, RetryError};
use uuid::Uuid;

use crate::{
    cancel::Cancel,
    cloud::Cloud,
    control::{BatchJobs, JobStatus, RestoreJobSpec},
    error::{Error, Result},
    format::{format_path, format_size},
    request::{RestoreRequest, RESTORE_EXPIRATION_DAYS},
    retry::Backoff,
    storage::Storage,
};

/// Uploads the local manifest to its durable location, replacing any earlier copy.
pub async fn publish_manifest(storage: &dyn Storage, request: &RestoreRequest) -> Result<()> {
    let bytes = fs::read(&request.manifest_local_path).await?;
    let size = bytes.len();
    storage
        .put(&request.manifest_bucket, &request.manifest_key, bytes)
        .await?;

    info!(
        "published manifest {} to s3://{}/{} ({})",
        format_path(&request.manifest_local_path),
        request.manifest_bucket,
        request.manifest_key,
        format_size(size)
    );
    Ok(())
}

/// Fetches the manifest's ETag with backoff. Once the budget is spent, a
/// single existence check decides which error to report.
pub async fn resolve_manifest_e_tag(
    storage: &dyn Storage,
    bucket: &str,
    key: &str,
    cancel: &Cancel,
) -> Result<String> {
    let lookup = Retry::spawn(Backoff::ETAG, || async move {
        match storage.e_tag(bucket, key).await {
            Ok(e_tag) => Ok(e_tag),
            Err(err) => {
                debug!("ETag lookup for s3://{bucket}/{key} failed: {err}");
                RetryError::to_transient(err)
            }
        }
    });

    let err = match cancel.guard(lookup).await {
        Ok(e_tag) => return Ok(e_tag),
        Err(Error::Cancelled) => return Err(Error::Cancelled),
        Err(err) => err,
    };

    let bucket = bucket.to_owned();
    let key = key.to_owned();
    match storage.exists(&bucket, &key).await {
        Ok(true) => Err(Error::ETagResolutionFailed {
            bucket,
            key,
            reason: err.to_string(),
        }),
        Ok(false) => Err(Error::ManifestMissing { bucket, key }),
        Err(exists_err) => {
            debug!("existence check failed: {exists_err}");
            Err(Error::ManifestMissing { bucket, key })
        }
    }
}

fn restore_job_spec(request: &RestoreRequest, manifest_e_tag: String) -> RestoreJobSpec {
    RestoreJobSpec {
        manifest_arn: request.manifest_arn(),
        manifest_e_tag,
        tier: request.tier(),
        expiration_days: RESTORE_EXPIRATION_DAYS,
        report_bucket_arn: request.report_bucket_arn(),
        report_prefix: request.report_prefix.clone(),
        role_arn: request.role_arn.clone(),
        priority: request.priority,
        client_request_token: Uuid::new_v4().to_string(),
    }
}

/// Creates the restore job. A rejected manifest gets one fresh ETag and one resubmission.
pub async fn submit_restore_job(
    cloud: &Cloud,
    request: &RestoreRequest,
    account_id: &str,
    cancel: &Cancel,
) -> Result<String> {
    let storage = cloud.storage.as_ref();
    let bucket = &request.manifest_bucket;
    let key = &request.manifest_key;

    let e_tag = resolve_manifest_e_tag(storage, bucket, key, cancel).await?;
    let spec = restore_job_spec(request, e_tag);
    debug!(
        "submitting {} restore job for {} with ETag {}",
        spec.tier, spec.manifest_arn, spec.manifest_e_tag
    );

    let job_id = match cloud.jobs.create_restore_job(account_id, &spec).await {
        Err(Error::InvalidManifest(message)) => {
            warn!("manifest was rejected ({message}), retrying with a fresh ETag");
            let e_tag = resolve_manifest_e_tag(storage, bucket, key, cancel).await?;
            let spec = restore_job_spec(request, e_tag);
            cloud.jobs.create_restore_job(account_id, &spec).await?
        }
        result => result?,
    };

    info!("created restore job {job_id}");
    Ok(job_id)
}

/// Polls until the job is ready to start (or already running). Failures
/// reported by the service end the wait early.
pub async fn wait_for_job(
    jobs: &dyn BatchJobs,
    account_id: &str,
    job_id: &str,
    cancel: &Cancel,
) -> Result<JobStatus> {
    let mut attempts = 0;
    let poll = Retry::spawn(Backoff::JOB_READY, || {
        attempts += 1;
        async move {
            let description = match jobs.describe_job(account_id, job_id).await {
                Ok(description) => description,
                Err(err) => {
                    debug!("describing job {job_id} failed: {err}");
                    return RetryError::to_transient(err);
                }
            };

            let status = description.status;
            if status.is_ready_to_start() || status.is_started() {
                Ok(status)
            } else if status.is_failed() {
                RetryError::to_permanent(Error::JobFailed {
                    job_id: job_id.to_owned(),
                    reasons: description.failure_reasons,
                })
            } else {
                match description.progress {
                    Some(progress) => debug!(
                        "job {job_id} is {status}, waiting ({} of {} tasks done, {} failed)",
                        progress.succeeded, progress.total, progress.failed
                    ),
                    None => debug!("job {job_id} is {status}, waiting"),
                }
                RetryError::to_transient(Error::UnexpectedJobStatus {
                    job_id: job_id.to_owned(),
                    status: status.to_string(),
                })
            }
        }
    });

    match cancel.guard(poll).await {
        Ok(status) => Ok(status),
        Err(err @ (Error::JobFailed { .. } | Error::Cancelled)) => Err(err),
        Err(err) => {
            debug!("giving up on job {job_id}: {err}");
            Err(Error::JobNotReady {
                job_id: job_id.to_owned(),
                attempts,
            })
        }
    }
}

/// Publishes the manifest, submits the restore job and starts it, returning the job ID.
pub async fn initiate_restore(
    cloud: &Cloud,
    request: &RestoreRequest,
    cancel: &Cancel,
) -> Result<String> {
    publish_manifest(cloud.storage.as_ref(), request).await?;

    let account_id = cloud.identity.account_id().await?;
    debug!("resolved account {account_id}");

    let job_id = submit_restore_job(cloud, request, &account_id, cancel).await?;
    let status = wait_for_job(cloud.jobs.as_ref(), &account_id, &job_id, cancel).await?;

    if status.is_ready_to_start() {
        cloud.jobs.start_job(&account_id, &job_id).await?;
        info!("started restore job {job_id}");
    } else {
        info!("restore job {job_id} is already {status}");
    }

    Ok(job_id)
}
