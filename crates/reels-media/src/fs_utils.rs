//! Filesystem helpers for rendered media.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Move a file from `src` to `dst`, falling back to copy+delete across devices.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    ensure_parent(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device rename, falling back to copy+delete"
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Sibling path for in-progress writes that keeps the container extension.
///
/// FFmpeg picks the muxer from the extension, so `x.mp4` becomes `x.part.mp4`.
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{}.part.{}", stem, ext.to_string_lossy())),
        None => path.with_file_name(format!("{}.part", stem)),
    }
}

/// Remove every entry of `dir`, skipping entries that cannot be removed.
///
/// Returns the number of entries removed. A missing directory is created.
pub async fn clear_dir(dir: &Path) -> MediaResult<usize> {
    clear_dir_with(dir, remove_entry).await
}

async fn remove_entry(path: PathBuf, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir_all(&path).await
    } else {
        fs::remove_file(&path).await
    }
}

async fn clear_dir_with<F, Fut>(dir: &Path, remove: F) -> MediaResult<usize>
where
    F: Fn(PathBuf, bool) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
        return Ok(0);
    }

    let mut removed = 0;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let result = match entry.file_type().await {
            Ok(ft) => remove(path.clone(), ft.is_dir()).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping entry, likely in use"),
        }
    }

    debug!(dir = %dir.display(), removed, "Directory cleared");
    Ok(removed)
}

/// Delete a file, ignoring a missing file.
pub async fn remove_if_exists(path: &Path) -> MediaResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MediaError::from(e)),
    }
}

async fn ensure_parent(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// EXDEV is 18 on Linux and macOS.
fn is_cross_device_error(e: &io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = partial_path(dst);

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::remove_file(src).await {
        warn!(src = %src.display(), error = %e, "Failed to remove source after cross-device move");
    }

    Ok(())
}
