use humantime::format_duration;

use crate::{
    cloud::Cloud,
    error::Result,
    format::{format_size, format_time},
    ops::build_manifest,
    stats::CommandStats,
};

use super::{args::ManifestArgs, config::load_request, print_stat, print_storage_stats};

pub async fn main(cli: ManifestArgs) -> Result<()> {
    let mut stats = CommandStats::new();
    let request = load_request(&cli.global).await?;
    let cloud = Cloud::from_env(request.region.clone()).await;

    let manifest = build_manifest(cloud.storage.as_ref(), &request).await?;
    let elapsed_time = stats.end();

    if cli.global.stats {
        print_stat("objects", manifest.stats.file_count);
        print_stat("total size", format_size(manifest.stats.total_size));
        print_stat("started", format_time(&stats.start_time));
        print_stat("elapsed time", format_duration(elapsed_time));
        print_storage_stats(&cloud.storage.stats());
    }

    Ok(())
}
