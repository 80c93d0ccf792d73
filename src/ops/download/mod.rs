mod files;


use std::{
    collections::HashSet,
    fmt,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_channel::{Receiver, Sender};
use humantime::format_duration;
use log::{error, info};
use tokio::{fs, sync::Mutex, task::JoinSet};

use crate::{
    error::{Error, Result},
    file::{create_dirs, set_ownership, system_chown, Chown},
    format::{format_path, format_size},
    manifest::ManifestEntry,
    request::Ownership,
    stats::CommandStats,
    storage::SharedStorage,
};

pub const DEFAULT_TASK_COUNT: usize = 10;

#[derive(Debug, Clone)]
pub struct DownloadArgs {
    pub base_path: PathBuf,
    pub tasks: usize,
    pub ownership: Option<Ownership>,
}

struct DownloadState {
    storage: SharedStorage,
    base_path: PathBuf,
    ownership: Option<Ownership>,
    chown: Chown,
    /// Directories below the base path created during this run.
    created_dirs: Mutex<HashSet<PathBuf>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub entry: ManifestEntry,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug)]
pub struct DownloadFailure {
    pub entry: ManifestEntry,
    pub error: Error,
}

impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.error)
    }
}

#[derive(Debug)]
pub struct DownloadReport {
    pub downloaded: Vec<Downloaded>,
    pub failed: Vec<DownloadFailure>,
    pub stats: CommandStats,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

type Outcome = (ManifestEntry, Result<Downloaded>);

/// Downloads every entry under the base path. Individual failures are
/// collected in the report rather than stopping the run.
pub async fn download_all(
    storage: SharedStorage,
    entries: Vec<ManifestEntry>,
    args: &DownloadArgs,
) -> Result<DownloadReport> {
    download_all_with(storage, entries, args, system_chown()).await
}

async fn download_all_with(
    storage: SharedStorage,
    entries: Vec<ManifestEntry>,
    args: &DownloadArgs,
    chown: Chown,
) -> Result<DownloadReport> {
    let mut stats = CommandStats::new();
    let (base_path, created_base) = prepare_base_path(&args.base_path).await?;
    if let Some(ownership) = args.ownership {
        for dir in &created_base {
            set_ownership(&chown, dir, ownership).await?;
        }
    }

    let state = Arc::new(DownloadState {
        storage,
        base_path,
        ownership: args.ownership,
        chown,
        created_dirs: Mutex::new(HashSet::new()),
    });

    let task_count = args.tasks.max(1);
    let (sender, receiver) = async_channel::bounded(task_count);
    let (outcome_sender, outcome_receiver) = async_channel::unbounded();

    let mut workers = JoinSet::new();
    for _ in 0..task_count {
        workers.spawn(download_worker(
            state.clone(),
            receiver.clone(),
            outcome_sender.clone(),
        ));
    }
    drop(receiver);
    drop(outcome_sender);

    info!(
        "downloading {} objects to {} with {task_count} tasks",
        entries.len(),
        format_path(&state.base_path)
    );
    for entry in entries {
        sender.send(entry).await?;
    }
    sender.close();

    while let Some(result) = workers.join_next().await {
        result?;
    }

    let mut downloaded = vec![];
    let mut failed = vec![];
    while let Ok((entry, outcome)) = outcome_receiver.recv().await {
        match outcome {
            Ok(file) => {
                stats.files_created += 1;
                stats.bytes_written += file.size;
                downloaded.push(file);
            }
            Err(error) => {
                stats.files_failed += 1;
                failed.push(DownloadFailure { entry, error });
            }
        }
    }

    let elapsed_time = stats.end();
    info!(
        "downloaded {} objects ({}) in {}, {} failed",
        downloaded.len(),
        format_size(stats.bytes_written),
        format_duration(elapsed_time),
        failed.len()
    );

    Ok(DownloadReport {
        downloaded,
        failed,
        stats,
    })
}

async fn download_worker(
    state: Arc<DownloadState>,
    receiver: Receiver<ManifestEntry>,
    outcomes: Sender<Outcome>,
) {
    while let Ok(entry) = receiver.recv().await {
        let outcome = files::download_entry(&state, &entry).await;
        if let Err(err) = &outcome {
            error!("failed to download {entry}: {err}");
        }

        if outcomes.send((entry, outcome)).await.is_err() {
            break;
        }
    }
}

/// Creates the base path if needed, returning it along with the directories
/// that had to be created.
async fn prepare_base_path(base_path: &Path) -> Result<(PathBuf, Vec<PathBuf>)> {
    if base_path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }

    let base_path = normalize(base_path);

    let created = create_dirs(&base_path).await?;
    match fs::metadata(&base_path).await {
        Ok(metadata) if metadata.is_dir() => Ok((base_path, created)),
        _ => Err(Error::DirectoryDoesNotExist(base_path)),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let normalized = path
        .components()
        .filter(|component| *component != Component::CurDir)
        .collect::<PathBuf>();

    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}
