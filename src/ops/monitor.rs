use std::{fmt, path::Path, time::Duration};

use clap::builder::styling::AnsiColor;
use humantime::format_duration;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::{
    cancel::Cancel,
    error::Result,
    manifest::{read_manifest, ManifestEntry},
    storage::{ObjectHead, Storage},
};

const STANDARD_STORAGE_CLASS: &str = "STANDARD";

static ONGOING_REQUEST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"ongoing-request\s*=\s*"(true|false)""#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    /// Archived with no restore in flight.
    Cold,
    Thawing,
    Available,
}

impl fmt::Display for RestoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreState::Cold => write!(f, "cold"),
            RestoreState::Thawing => write!(f, "thawing"),
            RestoreState::Available => write!(f, "available"),
        }
    }
}

pub fn classify(head: &ObjectHead) -> RestoreState {
    let class = head.storage_class.as_deref().unwrap_or_default();
    if class.is_empty() || class == STANDARD_STORAGE_CLASS {
        return RestoreState::Available;
    }

    let ongoing = head
        .restore
        .as_deref()
        .and_then(|restore| ONGOING_REQUEST_REGEX.captures(restore))
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str());

    match ongoing {
        Some("false") => RestoreState::Available,
        Some(_) => RestoreState::Thawing,
        None => RestoreState::Cold,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub min_sleep: Duration,
    pub max_sleep: Duration,
}

impl MonitorOptions {
    pub const DEFAULT_MIN_SLEEP: Duration = Duration::from_secs(15 * 60);
    pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_secs(45 * 60);

    /// Random pause in `[min_sleep, max_sleep)` so parallel restores don't poll in lockstep.
    pub fn sleep_duration(&self) -> Duration {
        if self.max_sleep <= self.min_sleep {
            self.min_sleep
        } else {
            rand::thread_rng().gen_range(self.min_sleep..self.max_sleep)
        }
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        MonitorOptions {
            min_sleep: MonitorOptions::DEFAULT_MIN_SLEEP,
            max_sleep: MonitorOptions::DEFAULT_MAX_SLEEP,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreProgress {
    pub available: usize,
    pub thawing: usize,
    pub cold: usize,
    pub unreachable: usize,
}

impl RestoreProgress {
    fn add(&mut self, state: RestoreState) {
        match state {
            RestoreState::Cold => self.cold += 1,
            RestoreState::Thawing => self.thawing += 1,
            RestoreState::Available => self.available += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRound {
    /// Entries that still can't be downloaded, in input order.
    pub pending: Vec<ManifestEntry>,
    pub progress: RestoreProgress,
}

/// Checks every entry once. Lookup failures leave the entry pending.
pub async fn check_restore_status(storage: &dyn Storage, entries: &[ManifestEntry]) -> StatusRound {
    let mut pending = vec![];
    let mut progress = RestoreProgress::default();

    for entry in entries {
        let state = match storage.head(&entry.bucket, &entry.key).await {
            Ok(head) => classify(&head),
            Err(err) => {
                warn!("could not check restore status of {entry}: {err}");
                progress.unreachable += 1;
                pending.push(entry.clone());
                continue;
            }
        };

        progress.add(state);
        if state == RestoreState::Available {
            let style = AnsiColor::Green.on_default();
            debug!("{style}{state}{style:#} {entry}");
        } else {
            let style = AnsiColor::BrightBlack.on_default();
            debug!("{style}{state}{style:#} {entry}");
            pending.push(entry.clone());
        }
    }

    StatusRound { pending, progress }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredEntries {
    pub entries: Vec<ManifestEntry>,
    pub rounds: u64,
}

/// Polls until every non-directory entry is available, sleeping between rounds.
/// Only cancellation ends the wait early.
pub async fn monitor_restore(
    storage: &dyn Storage,
    entries: Vec<ManifestEntry>,
    options: &MonitorOptions,
    cancel: &Cancel,
) -> Result<RestoredEntries> {
    let entries = entries
        .into_iter()
        .filter(|entry| !entry.is_directory())
        .collect::<Vec<_>>();

    let mut pending = entries.clone();
    let mut rounds = 0;
    loop {
        cancel.check()?;
        let round = cancel
            .guard(async { Ok(check_restore_status(storage, &pending).await) })
            .await?;
        rounds += 1;

        let StatusRound {
            pending: still_pending,
            progress,
        } = round;
        if still_pending.is_empty() {
            info!("all {} objects are available", entries.len());
            return Ok(RestoredEntries { entries, rounds });
        }

        let delay = options.sleep_duration();
        info!(
            "{} of {} objects available ({} thawing, {} cold, {} unreachable), checking again in {}",
            entries.len() - still_pending.len(),
            entries.len(),
            progress.thawing,
            progress.cold,
            progress.unreachable,
            format_duration(delay)
        );

        pending = still_pending;
        cancel.sleep(delay).await?;
    }
}

pub async fn monitor_manifest(
    storage: &dyn Storage,
    manifest_path: &Path,
    options: &MonitorOptions,
    cancel: &Cancel,
) -> Result<RestoredEntries> {
    let entries = read_manifest(manifest_path).await?;
    monitor_restore(storage, entries, options, cancel).await
}
