use std::{
    io,
    os::unix::fs::chown,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{fs, task::spawn_blocking};

use crate::{error::Result, request::Ownership};

pub async fn try_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Creates `dir` and any missing ancestors, returning the ones that didn't
/// exist beforehand (outermost first).
pub async fn create_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = vec![];
    let mut current = Some(dir);
    while let Some(path) = current {
        if path.as_os_str().is_empty() || try_exists(path).await? {
            break;
        }

        missing.push(path.to_owned());
        current = path.parent();
    }

    fs::create_dir_all(dir).await?;
    missing.reverse();
    Ok(missing)
}

/// Changes the owner of a path; `system_chown` outside tests.
pub type Chown = Arc<dyn Fn(&Path, Ownership) -> io::Result<()> + Send + Sync>;

pub fn system_chown() -> Chown {
    Arc::new(|path: &Path, ownership: Ownership| {
        chown(path, ownership.uid, ownership.gid)
    })
}

pub async fn set_ownership(chown: &Chown, path: &Path, ownership: Ownership) -> Result<()> {
    let chown = chown.clone();
    let path = path.to_owned();
    spawn_blocking(move || chown(&path, ownership)).await??;
    Ok(())
}
