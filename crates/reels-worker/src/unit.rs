//! Per-verse pipeline: audio, text, background, overlay, segment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use reels_models::{TextStyle, UnitTask};

use crate::assets::{AssetSelector, BackgroundCatalog, FontCatalog};
use crate::backend::{ComposeRequest, MediaBackend};
use crate::cache::DerivedAssetCache;
use crate::error::{WorkerError, WorkerResult};
use crate::fetch::{AudioSource, TextSource};
use crate::metrics;
use crate::retry::RetryExecutor;

/// One rendered verse. Owned by the job until concatenation, then released.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSegment {
    pub sequence_index: usize,
    pub audio_path: PathBuf,
    pub video_path: PathBuf,
    pub duration: f64,
}

impl RenderedSegment {
    /// Remove the segment's files.
    pub async fn release(&self, backend: &dyn MediaBackend) {
        backend.remove(&self.video_path).await;
        backend.remove(&self.audio_path).await;
    }
}

/// Turns one [`UnitTask`] into a [`RenderedSegment`].
///
/// Audio fetch with silence trim, text fetch and background normalization
/// are retried; background selection and composition are not.
#[derive(Clone)]
pub struct UnitProcessor {
    audio: Arc<dyn AudioSource>,
    text: Arc<dyn TextSource>,
    backend: Arc<dyn MediaBackend>,
    backgrounds: BackgroundCatalog,
    fonts: Arc<FontCatalog>,
    selector: Arc<dyn AssetSelector>,
    cache: Arc<DerivedAssetCache>,
    retry: RetryExecutor,
    audio_dir: PathBuf,
    segments_dir: PathBuf,
}

impl UnitProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        audio: Arc<dyn AudioSource>,
        text: Arc<dyn TextSource>,
        backend: Arc<dyn MediaBackend>,
        backgrounds: BackgroundCatalog,
        fonts: Arc<FontCatalog>,
        selector: Arc<dyn AssetSelector>,
        cache: Arc<DerivedAssetCache>,
        retry: RetryExecutor,
        audio_dir: PathBuf,
        segments_dir: PathBuf,
    ) -> Self {
        Self {
            audio,
            text,
            backend,
            backgrounds,
            fonts,
            selector,
            cache,
            retry,
            audio_dir,
            segments_dir,
        }
    }

    /// Render `task` onto a `canvas` of (width, height).
    pub async fn process(&self, task: &UnitTask, canvas: (u32, u32)) -> WorkerResult<RenderedSegment> {
        let audio_path = self.audio_dir.join(format!("part{}.mp3", task.sequence_index));

        match self.render(task, canvas, &audio_path).await {
            Ok(segment) => {
                metrics::record_unit_processed(task.template.as_str());
                info!(surah = task.surah, ayah = task.ayah, "Completed verse {}:{}", task.surah, task.ayah);
                Ok(segment)
            }
            Err(e) => {
                metrics::record_unit_failure(e.kind());
                warn!(surah = task.surah, ayah = task.ayah, error = %e, "Verse processing failed");
                self.backend.remove(&audio_path).await;
                Err(e)
            }
        }
    }

    async fn render(&self, task: &UnitTask, canvas: (u32, u32), audio_path: &Path) -> WorkerResult<RenderedSegment> {
        let (width, height) = canvas;
        let verse = format!("{}:{}", task.surah, task.ayah);

        self.retry
            .named(format!("audio {}", verse))
            .run_if(|| self.fetch_audio(task, audio_path), WorkerError::is_retryable)
            .await?;

        let duration = self
            .retry
            .named(format!("probe {}", verse))
            .run_if(|| self.backend.probe_duration(audio_path), WorkerError::is_retryable)
            .await?;

        let text = self
            .retry
            .named(format!("text {}", verse))
            .run_if(|| self.text.fetch_text(task.surah, task.ayah), WorkerError::is_retryable)
            .await?;

        let source = self.backgrounds.pick(task.background_style, self.selector.as_ref()).await?;

        let backend = &self.backend;
        let source_path = source.as_path();
        let background = self
            .retry
            .named(format!("background {}", verse))
            .run_if(
                || {
                    self.cache.get_or_create(source_path, width, height, move |tmp| async move {
                        backend.normalize_background(source_path, &tmp, width, height).await
                    })
                },
                WorkerError::is_retryable,
            )
            .await?;

        let style = TextStyle::for_text(&text, task.template);
        let font = self.fonts.pick(self.selector.as_ref());
        debug!(
            verse = %verse,
            font = %font.display(),
            font_size = style.font_size,
            words_per_line = style.words_per_line,
            "Overlay style chosen"
        );

        let request = ComposeRequest {
            background,
            audio: audio_path.to_path_buf(),
            text: style.wrap(&text),
            font,
            font_size: style.font_size,
            color: task.template.text_color().ffmpeg_color().to_string(),
            duration,
            width,
            height,
        };
        let video_path = self.segments_dir.join(format!("segment_{:03}.mp4", task.sequence_index));
        self.backend.compose_segment(&request, &video_path).await?;

        Ok(RenderedSegment {
            sequence_index: task.sequence_index,
            audio_path: audio_path.to_path_buf(),
            video_path,
            duration,
        })
    }

    async fn fetch_audio(&self, task: &UnitTask, path: &Path) -> WorkerResult<()> {
        let bytes = self.audio.fetch_audio(&task.reciter, task.surah, task.ayah).await?;
        tokio::fs::write(path, &bytes).await?;
        self.backend.trim_silence(path).await
    }
}
