use humantime::format_duration;
use itertools::Itertools;
use log::warn;

use crate::{
    cloud::Cloud,
    error::Result,
    format::{format_path, format_size},
    manifest::read_manifest,
    ops::{download_all, DownloadArgs as DownloadOptions},
};

use super::{args::DownloadArgs, config::load_request, print_stat, print_storage_stats};

pub async fn main(cli: DownloadArgs) -> Result<()> {
    let request = load_request(&cli.global).await?;
    let cloud = Cloud::from_env(request.region.clone()).await;

    let manifest_path = cli
        .manifest
        .unwrap_or_else(|| request.manifest_local_path.clone());
    let entries = read_manifest(&manifest_path)
        .await?
        .into_iter()
        .filter(|entry| !entry.is_directory())
        .collect();

    let options = DownloadOptions {
        base_path: request.base_path.clone(),
        tasks: cli.tasks,
        ownership: request.ownership(),
    };
    let report = download_all(cloud.storage.clone(), entries, &options).await?;

    if !report.is_complete() {
        let keys = report
            .failed
            .iter()
            .map(|failure| failure.entry.key.as_str())
            .join(", ");
        warn!("{} objects could not be downloaded: {keys}", report.failed.len());
    }

    if cli.global.stats {
        print_stat("manifest", format_path(&manifest_path));
        print_stat("files created", report.stats.files_created);
        print_stat("files failed", report.stats.files_failed);
        print_stat("bytes written", format_size(report.stats.bytes_written));
        print_stat("elapsed time", format_duration(report.stats.elapsed_time()));
        print_storage_stats(&cloud.storage.stats());
    }

    Ok(())
}
