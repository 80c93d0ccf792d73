use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use clap::builder::styling::AnsiColor;
use log::{debug, warn};
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};

use crate::{
    error::{Error, Result},
    file::{create_dirs, set_ownership},
    format::{format_path, format_size},
    manifest::ManifestEntry,
    request::Ownership,
};

use super::{DownloadState, Downloaded};

/// Maps an object key onto a path under `base`. Keys that would escape the
/// base (or name the base itself) are rejected.
pub fn target_path(base: &Path, key: &str) -> Result<PathBuf> {
    let mut path = base.to_owned();
    let mut depth = 0;
    for component in Path::new(key).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(Error::InvalidKey(key.to_owned()));
            }
        }
    }

    if depth == 0 {
        Err(Error::InvalidKey(key.to_owned()))
    } else {
        Ok(path)
    }
}

/// `dir/name.ext` becomes `dir/name_N.ext`.
pub fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match path.extension() {
        Some(extension) => format!("{stem}_{n}.{}", extension.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    path.with_file_name(file_name)
}

/// Opens the first free name among `path`, `path_1`, `path_2`, ...
async fn create_unique(path: &Path) -> Result<(File, PathBuf)> {
    let mut candidate = path.to_owned();
    let mut n = 0;
    loop {
        let result = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await;

        match result {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                n += 1;
                candidate = numbered_path(path, n);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn remove_partial(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        warn!("could not remove partial file {}: {err}", format_path(path));
    }
}

pub(super) async fn download_entry(
    state: &DownloadState,
    entry: &ManifestEntry,
) -> Result<Downloaded> {
    let target = target_path(&state.base_path, &entry.key)?;
    if let Some(parent) = target.parent() {
        // held across creation: a directory is recorded before anything inside it can finish
        let mut created_dirs = state.created_dirs.lock().await;
        created_dirs.extend(create_dirs(parent).await?);
    }

    let (file, path) = create_unique(&target).await?;
    if path != target {
        debug!(
            "{} already exists, writing to {}",
            format_path(&target),
            format_path(&path)
        );
    }

    let result = write_entry(state, entry, file).await;
    let size = match result {
        Ok(size) => size,
        Err(err) => {
            remove_partial(&path).await;
            return Err(err);
        }
    };

    if let Some(ownership) = state.ownership {
        if let Err(err) = apply_ownership(state, &path, ownership).await {
            remove_partial(&path).await;
            return Err(err);
        }
    }

    let formatted_path = format_path(&path);
    let formatted_size = format_size(size);
    let msg_style = AnsiColor::Blue.on_default();
    let size_style = AnsiColor::BrightBlack.on_default();
    debug!(
        "{msg_style}downloaded{msg_style:#} {entry} to {formatted_path} {size_style}({formatted_size}){size_style:#}"
    );

    Ok(Downloaded {
        entry: entry.clone(),
        path,
        size,
    })
}

/// Owns the file and every directory created for it this run, including
/// ones another worker created before its own entry failed.
async fn apply_ownership(state: &DownloadState, path: &Path, ownership: Ownership) -> Result<()> {
    let dirs = {
        let created_dirs = state.created_dirs.lock().await;
        path.ancestors()
            .skip(1)
            .take_while(|dir| *dir != state.base_path)
            .filter(|dir| created_dirs.contains(*dir))
            .map(Path::to_owned)
            .collect::<Vec<_>>()
    };

    for dir in dirs.iter().rev() {
        set_ownership(&state.chown, dir, ownership).await?;
    }
    set_ownership(&state.chown, path, ownership).await
}

async fn write_entry(state: &DownloadState, entry: &ManifestEntry, file: File) -> Result<u64> {
    let mut writer = BufWriter::new(file);
    let size = state
        .storage
        .download(&entry.bucket, &entry.key, &mut writer)
        .await?;
    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(size)
}
