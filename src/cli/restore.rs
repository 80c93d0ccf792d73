use humantime::format_duration;
use log::warn;

use crate::{
    cloud::Cloud,
    error::Result,
    format::format_size,
    ops::{run_restore, RestoreOptions},
};

use super::{args::RestoreArgs, config::load_request, create_cancel, print_stat, print_storage_stats};

pub async fn main(cli: RestoreArgs) -> Result<()> {
    let request = load_request(&cli.global).await?;
    let cloud = Cloud::from_env(request.region.clone()).await;
    let cancel = create_cancel(&cli.global);

    let options = RestoreOptions {
        tasks: cli.tasks,
        monitor: cli.poll.monitor_options(),
    };
    let outcome = run_restore(&cloud, &request, &options, &cancel).await?;

    let report = &outcome.report;
    if !report.is_complete() {
        warn!(
            "{} of {} objects could not be downloaded",
            report.failed.len(),
            report.failed.len() + report.downloaded.len()
        );
    }

    if cli.global.stats {
        print_stat("job", &outcome.job_id);
        print_stat("objects in manifest", outcome.manifest.file_count);
        print_stat("manifest size", format_size(outcome.manifest.total_size));
        print_stat("status checks", outcome.poll_rounds);
        print_stat("files created", report.stats.files_created);
        print_stat("files failed", report.stats.files_failed);
        print_stat("bytes written", format_size(report.stats.bytes_written));
        print_stat("download time", format_duration(report.stats.elapsed_time()));
        print_storage_stats(&cloud.storage.stats());
    }

    Ok(())
}
