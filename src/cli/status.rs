use log::info;

use crate::{
    cloud::Cloud,
    error::Result,
    manifest::read_manifest,
    ops::{check_restore_status, monitor_restore},
};

use super::{args::StatusArgs, config::load_request, create_cancel, print_stat, print_storage_stats};

pub async fn main(cli: StatusArgs) -> Result<()> {
    let request = load_request(&cli.global).await?;
    let cloud = Cloud::from_env(request.region.clone()).await;
    let entries = read_manifest(&request.manifest_local_path)
        .await?
        .into_iter()
        .filter(|entry| !entry.is_directory())
        .collect::<Vec<_>>();

    if cli.wait {
        let cancel = create_cancel(&cli.global);
        let options = cli.poll.monitor_options();
        let restored = monitor_restore(cloud.storage.as_ref(), entries, &options, &cancel).await?;
        if cli.global.stats {
            print_stat("status checks", restored.rounds);
        }
    } else {
        let round = check_restore_status(cloud.storage.as_ref(), &entries).await;
        let progress = round.progress;
        info!(
            "{} of {} objects available",
            progress.available,
            entries.len()
        );
        print_stat("thawing", progress.thawing);
        print_stat("cold", progress.cold);
        print_stat("unreachable", progress.unreachable);
    }

    if cli.global.stats {
        print_storage_stats(&cloud.storage.stats());
    }

    Ok(())
}
