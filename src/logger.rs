use std::io::{self, Write};

use chrono::Local;
use clap::builder::styling::AnsiColor;
use concolor_clap::ColorChoice;
use env_logger::{fmt::Formatter, WriteStyle};
use log::{Level, LevelFilter, Record};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn init(level: LevelFilter, color: ColorChoice, timestamps: bool) {
    let format: fn(&mut Formatter, &Record) -> io::Result<()> = if timestamps {
        format_with_timestamp
    } else {
        format_plain
    };

    env_logger::Builder::new()
        .format(format)
        .filter_level(level)
        .write_style(write_style(color))
        .init();
}

pub fn level_from_args(verbose: u8, quiet: u8) -> LevelFilter {
    let verbosity = i16::from(verbose) - i16::from(quiet);
    match verbosity {
        i16::MIN..=-2 => LevelFilter::Error,
        -1 => LevelFilter::Warn,
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn write_style(color: ColorChoice) -> WriteStyle {
    match color {
        ColorChoice::Always => WriteStyle::Always,
        ColorChoice::Never => WriteStyle::Never,
        _ => WriteStyle::Auto,
    }
}

fn format_plain(f: &mut Formatter, record: &Record) -> io::Result<()> {
    write_record(f, record)
}

fn format_with_timestamp(f: &mut Formatter, record: &Record) -> io::Result<()> {
    let style = AnsiColor::BrightBlack.on_default();
    let now = Local::now().format(TIMESTAMP_FORMAT);
    write!(f, "{style}[{now}]{style:#} ")?;
    write_record(f, record)
}

fn write_record(f: &mut Formatter, record: &Record) -> io::Result<()> {
    let args = record.args();
    let level = record.level();
    if let Some(prefix) = level_prefix(level) {
        let style = f.default_level_style(level);
        writeln!(f, "{style}{prefix}{style:#}{args}")
    } else {
        writeln!(f, "{args}")
    }
}

fn level_prefix(level: Level) -> Option<&'static str> {
    match level {
        Level::Debug | Level::Trace | Level::Info => None,
        Level::Warn => Some("warning: "),
        Level::Error => Some("error: "),
    }
}
