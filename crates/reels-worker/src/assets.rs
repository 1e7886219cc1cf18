//! Background and font catalogs with injectable random selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{info, warn};

use reels_models::BackgroundStyle;

use crate::error::{WorkerError, WorkerResult};

/// Font used when the fonts directory has no `.ttf` files.
pub const FALLBACK_FONT: &str = "DUBAI-BOLD.TTF";

/// Picks one of `len` candidates. All randomness in the pipeline goes through here.
pub trait AssetSelector: Send + Sync {
    /// Index in `0..len`, or `None` when `len` is 0.
    fn choose(&self, len: usize) -> Option<usize>;
}

/// Uniform choice from a seedable RNG.
#[derive(Debug)]
pub struct RandomSelector {
    rng: Mutex<StdRng>,
}

impl RandomSelector {
    /// Seeded selectors repeat the same choices for the same inputs.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng: Mutex::new(rng) }
    }
}

impl AssetSelector for RandomSelector {
    fn choose(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Some(rng.random_range(0..len))
    }
}

/// Always picks the same position, wrapped to the candidate count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSelector(pub usize);

impl AssetSelector for FixedSelector {
    fn choose(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0 % len)
    }
}

/// Files in `dir` starting with `prefix` and ending with `suffix`, sorted by name.
async fn list_matching(dir: &Path, prefix: &str, suffix: &str) -> WorkerResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let suffix = suffix.to_lowercase();
    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(prefix) && name.to_lowercase().ends_with(&suffix) && entry.path().is_file() {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}

/// Background clips grouped by style prefix.
#[derive(Debug, Clone)]
pub struct BackgroundCatalog {
    dir: PathBuf,
}

impl BackgroundCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All clips of `style`.
    pub async fn list(&self, style: BackgroundStyle) -> WorkerResult<Vec<PathBuf>> {
        list_matching(&self.dir, style.prefix(), ".mp4").await
    }

    /// Pick a clip of `style`, falling back to the default style.
    pub async fn pick(&self, style: BackgroundStyle, selector: &dyn AssetSelector) -> WorkerResult<PathBuf> {
        let mut candidates = self.list(style).await?;

        if candidates.is_empty() && style != BackgroundStyle::default() {
            warn!(style = %style, "No backgrounds for style, falling back to default");
            candidates = self.list(BackgroundStyle::default()).await?;
        }

        let index = selector.choose(candidates.len()).ok_or_else(|| {
            WorkerError::no_background(format!("{} has no {} or fallback clips", self.dir.display(), style))
        })?;
        let selected = candidates.swap_remove(index);
        info!(background = %selected.display(), "Selected background");
        Ok(selected)
    }
}

/// `.ttf` fonts available for the overlay, refreshed on demand.
#[derive(Debug)]
pub struct FontCatalog {
    dir: PathBuf,
    fonts: RwLock<Vec<PathBuf>>,
}

impl FontCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fonts: RwLock::new(Vec::new()),
        }
    }

    /// Rescan the fonts directory and return what was found.
    pub async fn refresh(&self) -> WorkerResult<Vec<PathBuf>> {
        let found = list_matching(&self.dir, "", ".ttf").await?;
        info!(count = found.len(), dir = %self.dir.display(), "Fonts refreshed");
        let mut fonts = match self.fonts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *fonts = found.clone();
        Ok(found)
    }

    /// Fonts found by the last refresh.
    pub fn fonts(&self) -> Vec<PathBuf> {
        match self.fonts.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Font file names found by the last refresh.
    pub fn font_names(&self) -> Vec<String> {
        self.fonts()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect()
    }

    pub fn fallback(&self) -> PathBuf {
        self.dir.join(FALLBACK_FONT)
    }

    /// Pick a font, or the fallback when none are known.
    pub fn pick(&self, selector: &dyn AssetSelector) -> PathBuf {
        let fonts = self.fonts();
        match selector.choose(fonts.len()) {
            Some(index) => fonts[index].clone(),
            None => self.fallback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn test_seeded_selector_is_repeatable() {
        let a = RandomSelector::new(Some(7));
        let b = RandomSelector::new(Some(7));
        let picks_a: Vec<_> = (0..20).map(|_| a.choose(5).unwrap()).collect();
        let picks_b: Vec<_> = (0..20).map(|_| b.choose(5).unwrap()).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|i| *i < 5));
        assert_eq!(a.choose(0), None);
    }

    #[test]
    fn test_fixed_selector_wraps() {
        assert_eq!(FixedSelector(7).choose(3), Some(1));
        assert_eq!(FixedSelector(0).choose(0), None);
    }

    #[tokio::test]
    async fn test_pick_background_by_style() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["night_part1.mp4", "night_part2.mp4", "nature_part1.mp4", "night_part3.mov"]);
        let catalog = BackgroundCatalog::new(dir.path());

        let listed = catalog.list(BackgroundStyle::Night).await.unwrap();
        assert_eq!(listed.len(), 2);

        let picked = catalog.pick(BackgroundStyle::Night, &FixedSelector(1)).await.unwrap();
        assert_eq!(picked.file_name().unwrap(), "night_part2.mp4");
    }

    #[tokio::test]
    async fn test_pick_background_falls_back_to_nature() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["nature_part9.mp4"]);
        let catalog = BackgroundCatalog::new(dir.path());

        let picked = catalog.pick(BackgroundStyle::Colorful, &FixedSelector(0)).await.unwrap();
        assert_eq!(picked.file_name().unwrap(), "nature_part9.mp4");
    }

    #[tokio::test]
    async fn test_no_background_at_all() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), &["islamic_part1.mp4"]);
        let catalog = BackgroundCatalog::new(dir.path());

        let err = catalog.pick(BackgroundStyle::Night, &FixedSelector(0)).await.unwrap_err();
        assert!(matches!(err, WorkerError::NoBackground(_)));

        let missing = BackgroundCatalog::new(dir.path().join("missing"));
        let err = missing.pick(BackgroundStyle::Nature, &FixedSelector(0)).await.unwrap_err();
        assert!(matches!(err, WorkerError::NoBackground(_)));
    }

    #[tokio::test]
    async fn test_font_catalog_refresh_and_fallback() {
        let dir = TempDir::new().unwrap();
        let catalog = FontCatalog::new(dir.path());

        assert_eq!(catalog.pick(&FixedSelector(0)), dir.path().join(FALLBACK_FONT));

        touch(dir.path(), &["Amiri.ttf", "Scheherazade.TTF", "readme.txt"]);
        let fonts = catalog.refresh().await.unwrap();
        assert_eq!(fonts.len(), 2);
        assert_eq!(catalog.font_names(), vec!["Amiri.ttf", "Scheherazade.TTF"]);
        assert_eq!(catalog.pick(&FixedSelector(1)), dir.path().join("Scheherazade.TTF"));
    }
}
