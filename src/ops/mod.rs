mod download;
mod initiate;
mod manifest;
mod monitor;
mod pipeline;


pub use {
    download::{
        download_all, DownloadArgs, DownloadFailure, DownloadReport, Downloaded,
        DEFAULT_TASK_COUNT,
    },
    initiate::{
        initiate_restore, publish_manifest, resolve_manifest_e_tag, submit_restore_job,
        wait_for_job,
    },
    manifest::{build_manifest, collect_entries, BuiltManifest},
    monitor::{
        check_restore_status, classify, monitor_manifest, monitor_restore, MonitorOptions,
        RestoreProgress, RestoreState, RestoredEntries, StatusRound,
    },
    pipeline::{run_restore, RestoreOptions, RestoreOutcome},
};
