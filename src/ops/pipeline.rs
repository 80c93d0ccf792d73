use log::info;

use crate::{
    cancel::Cancel,
    cloud::Cloud,
    error::Result,
    format::format_size,
    request::RestoreRequest,
    stats::ManifestStats,
};

use super::{
    build_manifest, download_all, initiate_restore, monitor_restore, DownloadArgs, DownloadReport,
    MonitorOptions,
};

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub tasks: usize,
    pub monitor: MonitorOptions,
}

#[derive(Debug)]
pub struct RestoreOutcome {
    pub job_id: String,
    pub manifest: ManifestStats,
    pub poll_rounds: u64,
    pub report: DownloadReport,
}

/// Runs every stage of a restore in order, stopping at the first stage that fails.
pub async fn run_restore(
    cloud: &Cloud,
    request: &RestoreRequest,
    options: &RestoreOptions,
    cancel: &Cancel,
) -> Result<RestoreOutcome> {
    if let (Some(project_id), Some(user)) = (request.project_id, &request.user) {
        info!("restoring project {project_id} for {user}");
    }

    let manifest = build_manifest(cloud.storage.as_ref(), request).await?;
    info!(
        "found {} objects ({}) under {}",
        manifest.stats.file_count,
        format_size(manifest.stats.total_size),
        request.restore_path
    );

    let job_id = initiate_restore(cloud, request, cancel).await?;

    let restored = monitor_restore(
        cloud.storage.as_ref(),
        manifest.entries,
        &options.monitor,
        cancel,
    )
    .await?;
    info!(
        "objects available after {} status checks, downloading",
        restored.rounds
    );

    let args = DownloadArgs {
        base_path: request.base_path.clone(),
        tasks: options.tasks,
        ownership: request.ownership(),
    };
    let report = download_all(cloud.storage.clone(), restored.entries, &args).await?;

    Ok(RestoreOutcome {
        job_id,
        manifest: manifest.stats,
        poll_rounds: restored.rounds,
        report,
    })
}
