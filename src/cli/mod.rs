mod args;
mod config;
mod download;
mod manifest;
mod parse;
mod restore;
mod status;

use std::{fmt::Display, process::ExitCode};

use clap::{
    builder::{styling::AnsiColor, Styles},
    Parser, Subcommand,
};
use humantime::format_duration;
use log::{error, info, warn};
use tokio::{signal, spawn};

use crate::{cancel::Cancel, format::format_size, logger, storage::StorageStats};

use self::args::{DownloadArgs, GlobalArgs, LoggerArgs, ManifestArgs, RestoreArgs, StatusArgs};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, propagate_version = true, styles = cli_styles())]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the manifest, start the restore job, wait for it and download everything
    Restore(RestoreArgs),

    /// Only build the local manifest
    Manifest(ManifestArgs),

    /// Check how many manifest objects are available
    Status(StatusArgs),

    /// Download the objects in an existing manifest
    Download(DownloadArgs),
}

impl Command {
    fn global(&self) -> &GlobalArgs {
        match self {
            Command::Restore(args) => &args.global,
            Command::Manifest(args) => &args.global,
            Command::Status(args) => &args.global,
            Command::Download(args) => &args.global,
        }
    }
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(&cli.command.global().logger);

    let result = match cli.command {
        Command::Restore(args) => restore::main(args).await,
        Command::Manifest(args) => manifest::main(args).await,
        Command::Status(args) => status::main(args).await,
        Command::Download(args) => download::main(args).await,
    };

    if let Err(err) = result {
        error!("{err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logger(args: &LoggerArgs) {
    let level = logger::level_from_args(args.verbose, args.quiet);
    logger::init(level, args.color, args.timestamps);
}

/// Cancellation for a whole command: the `--timeout` deadline or Ctrl-C, whichever comes first.
fn create_cancel(args: &GlobalArgs) -> Cancel {
    let (cancel, interrupter) = Cancel::new(args.timeout);
    spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping");
            interrupter.interrupt();
        }
    });

    if let Some(timeout) = args.timeout {
        info!("giving up after {}", format_duration(timeout));
    }

    cancel
}

fn print_stat<T: Display>(name: &str, value: T) {
    let style = AnsiColor::BrightBlack.on_default();
    info!("{style}{name}:{style:#} {value}");
}

fn print_storage_stats(stats: &StorageStats) {
    print_stat("bytes downloaded", format_size(stats.bytes_downloaded));
    print_stat("bytes uploaded", format_size(stats.bytes_uploaded));
    print_stat("list requests", stats.list_requests);
    print_stat("head requests", stats.head_requests);
    print_stat("get requests", stats.get_requests);
    print_stat("put requests", stats.put_requests);
}

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default())
        .usage(AnsiColor::BrightMagenta.on_default())
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightCyan.on_default())
}
