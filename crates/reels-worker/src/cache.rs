//! Derived background cache.
//!
//! Maps a source clip and target geometry to a normalized copy on disk,
//! named `<stem>_<w>x<h>.mp4`. A non-empty file at that path is taken as
//! valid without inspecting its content, so changing the normalization
//! parameters requires changing the naming scheme or clearing the directory.
//!
//! Creation writes to a sibling temp file and renames it into place, and
//! concurrent callers for the same key wait on a per-key lock, so a failed
//! or in-flight creation is never served.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use reels_media::{partial_path, remove_if_exists};

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Extension of derived assets.
const DERIVED_EXTENSION: &str = "mp4";

/// On-disk cache of geometry-normalized backgrounds.
#[derive(Debug)]
pub struct DerivedAssetCache {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DerivedAssetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for a source clip at a target size.
    pub fn cache_key(source: &Path, width: u32, height: u32) -> String {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "asset".to_string());
        format!("{}_{}x{}.{}", stem, width, height, DERIVED_EXTENSION)
    }

    /// Path the derived asset lives at.
    pub fn path_for(&self, source: &Path, width: u32, height: u32) -> PathBuf {
        self.dir.join(Self::cache_key(source, width, height))
    }

    /// Return the derived asset, creating it with `create` if absent.
    ///
    /// `create` receives the temp path it must write to.
    pub async fn get_or_create<F, Fut>(
        &self,
        source: &Path,
        width: u32,
        height: u32,
        create: F,
    ) -> WorkerResult<PathBuf>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = WorkerResult<()>>,
    {
        tokio::fs::create_dir_all(&self.dir).await?;

        let key = Self::cache_key(source, width, height);
        let target = self.dir.join(&key);

        let key_lock = self.lock_for(&key);
        let _guard = key_lock.lock().await;

        if is_valid(&target).await {
            debug!(path = %target.display(), "Derived asset cache hit");
            metrics::record_cache_hit();
            return Ok(target);
        }
        metrics::record_cache_miss();

        // A zero-byte leftover is not a valid entry
        remove_if_exists(&target).await?;

        let tmp = partial_path(&target);
        remove_if_exists(&tmp).await?;

        if let Err(e) = create(tmp.clone()).await {
            let _ = remove_if_exists(&tmp).await;
            return Err(e);
        }

        if !is_valid(&tmp).await {
            let _ = remove_if_exists(&tmp).await;
            return Err(WorkerError::transcode(format!(
                "Derived asset for {} is missing or empty",
                source.display()
            )));
        }

        tokio::fs::rename(&tmp, &target).await?;
        info!(path = %target.display(), "Derived asset created");
        Ok(target)
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(key.to_string()).or_default().clone()
    }
}

async fn is_valid(path: &Path) -> bool {
    matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() > 0)
}
