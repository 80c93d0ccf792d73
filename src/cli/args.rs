use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Args};
use concolor_clap::ColorChoice;

use crate::ops::{MonitorOptions, DEFAULT_TASK_COUNT};

use super::parse::{parse_nonzero_duration, parse_task_count};

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Number of download tasks to use
    #[arg(
        short = 'j',
        long,
        value_name = "NUM",
        default_value_t = DEFAULT_TASK_COUNT,
        value_parser = parse_task_count,
    )]
    pub tasks: usize,

    #[command(flatten)]
    pub poll: PollArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Keep checking until every object is available
    #[arg(short, long, default_value_t = false)]
    pub wait: bool,

    #[command(flatten)]
    pub poll: PollArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Manifest to download from (defaults to the configured local manifest)
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Number of download tasks to use
    #[arg(
        short = 'j',
        long,
        value_name = "NUM",
        default_value_t = DEFAULT_TASK_COUNT,
        value_parser = parse_task_count,
    )]
    pub tasks: usize,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct PollArgs {
    /// Shortest pause between status checks
    #[arg(long, value_name = "DURATION", value_parser = parse_nonzero_duration)]
    pub min_sleep: Option<Duration>,

    /// Longest pause between status checks
    #[arg(long, value_name = "DURATION", value_parser = parse_nonzero_duration)]
    pub max_sleep: Option<Duration>,
}

impl PollArgs {
    pub fn monitor_options(&self) -> MonitorOptions {
        let defaults = MonitorOptions::default();
        MonitorOptions {
            min_sleep: self.min_sleep.unwrap_or(defaults.min_sleep),
            max_sleep: self.max_sleep.unwrap_or(defaults.max_sleep),
        }
    }
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Restore parameters as a JSON file (defaults to the `RESTORE_PARAMS` variable)
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Give up once this much time has passed (e.g. '36h')
    #[arg(short = 'T', long, value_name = "DURATION", value_parser = parse_nonzero_duration)]
    pub timeout: Option<Duration>,

    /// Print stats after completion
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    #[command(flatten)]
    pub logger: LoggerArgs,
}

#[derive(Args, Debug)]
pub struct LoggerArgs {
    /// When to use color in output
    #[arg(short, long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Prefix each line with the local time
    #[arg(long, default_value_t = false)]
    pub timestamps: bool,

    /// Print more output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub verbose: u8,

    /// Print less output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub quiet: u8,
}
