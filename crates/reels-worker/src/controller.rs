//! Job lifecycle: validation, pool sizing, dispatch, assembly, cleanup.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, Instrument};

use reels_media::clear_dir;
use reels_models::{
    output_filename, surah_name, JobId, JobPhase, JobRequest, Language, OutputFormat, QualityPreset, StatusMessage,
    Template, UnitRange, UnitTask,
};

use crate::assets::{AssetSelector, BackgroundCatalog, FontCatalog, RandomSelector};
use crate::backend::{FfmpegBackend, MediaBackend};
use crate::cache::DerivedAssetCache;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::fetch::{build_http_client, AudioSource, HttpAudioSource, HttpTextSource, TextSource};
use crate::logging::JobLogger;
use crate::metrics;
use crate::progress::{ProgressStore, RunningGuard};
use crate::resource::{worker_count, ResourceMonitor, SystemMonitor};
use crate::retry::RetryExecutor;
use crate::unit::{RenderedSegment, UnitProcessor};

/// Concatenated timeline, inside the segments dir.
const TIMELINE_FILE: &str = "timeline.mp4";

/// External collaborators of the pipeline.
pub struct PipelineDeps {
    pub audio: Arc<dyn AudioSource>,
    pub text: Arc<dyn TextSource>,
    pub backend: Arc<dyn MediaBackend>,
    pub monitor: Arc<dyn ResourceMonitor>,
    pub selector: Arc<dyn AssetSelector>,
    pub fonts: Arc<FontCatalog>,
}

impl PipelineDeps {
    /// HTTP sources, FFmpeg backend and live system sampling.
    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        let client = build_http_client(config.http_timeout)?;
        Ok(Self {
            audio: Arc::new(HttpAudioSource::new(client.clone(), config.audio_base_url.clone())),
            text: Arc::new(HttpTextSource::new(
                client,
                config.text_base_url.clone(),
                config.text_edition.clone(),
            )),
            backend: Arc::new(FfmpegBackend::new(config)),
            monitor: Arc::new(SystemMonitor::new()),
            selector: Arc::new(RandomSelector::new(config.rng_seed)),
            fonts: Arc::new(FontCatalog::new(config.fonts_dir.clone())),
        })
    }
}

/// Single-verse, low quality reels request used for previews.
pub fn preview_request(reciter: impl Into<String>, surah: u32, ayah: u32, template: Template) -> JobRequest {
    JobRequest::new(reciter, surah, ayah, Some(ayah))
        .with_quality(QualityPreset::Low)
        .with_format(OutputFormat::Reels)
        .with_template(template)
}

/// Owns the lifecycle of the single active job.
#[derive(Clone)]
pub struct JobController {
    config: Arc<WorkerConfig>,
    progress: ProgressStore,
    monitor: Arc<dyn ResourceMonitor>,
    backend: Arc<dyn MediaBackend>,
    fonts: Arc<FontCatalog>,
    processor: UnitProcessor,
}

impl JobController {
    pub fn new(config: WorkerConfig, deps: PipelineDeps, progress: ProgressStore) -> Self {
        let log_store = progress.clone();
        let retry = RetryExecutor::new("unit")
            .with_max_attempts(config.retry_attempts)
            .with_base_delay(config.retry_base_delay)
            .with_observer(move |event| log_store.log(event.to_string()));

        let processor = UnitProcessor::new(
            deps.audio,
            deps.text,
            deps.backend.clone(),
            BackgroundCatalog::new(config.backgrounds_dir.clone()),
            deps.fonts.clone(),
            deps.selector,
            Arc::new(DerivedAssetCache::new(config.bg_cache_dir.clone())),
            retry,
            config.audio_dir.clone(),
            config.segments_dir.clone(),
        );

        Self {
            config: Arc::new(config),
            progress,
            monitor: deps.monitor,
            backend: deps.backend,
            fonts: deps.fonts,
            processor,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn fonts(&self) -> &Arc<FontCatalog> {
        &self.fonts
    }

    /// Accept a job and run it in the background.
    ///
    /// Rejected with [`WorkerError::AlreadyRunning`] while another job runs,
    /// or [`WorkerError::InvalidRequest`] for an unknown surah; neither
    /// touches the progress state.
    pub fn submit(&self, request: JobRequest) -> WorkerResult<JobId> {
        let range = request.resolve_range()?;
        let guard = self.progress.try_start(StatusMessage::Preparing.render(request.language))?;

        let job_id = JobId::new();
        let span = JobLogger::new(&job_id, "render_reel").create_span();
        let controller = self.clone();
        let id = job_id.clone();
        tokio::spawn(
            async move {
                let _ = controller.execute(id, request, range, guard).await;
            }
            .instrument(span),
        );

        Ok(job_id)
    }

    /// Run a job to completion on the current task.
    pub async fn run(&self, request: JobRequest) -> WorkerResult<PathBuf> {
        let range = request.resolve_range()?;
        let guard = self.progress.try_start(StatusMessage::Preparing.render(request.language))?;
        self.execute(JobId::new(), request, range, guard).await
    }

    async fn execute(
        &self,
        job_id: JobId,
        request: JobRequest,
        range: UnitRange,
        guard: RunningGuard,
    ) -> WorkerResult<PathBuf> {
        let logger = JobLogger::new(&job_id, "render_reel");
        logger.log_start(&format!(
            "surah {} verses {}-{} ({}, {}, {})",
            request.surah, range.start, range.end, request.quality, request.format, request.template
        ));
        let started = Instant::now();
        let timeline = self.config.segments_dir.join(TIMELINE_FILE);
        let mut segments = Vec::new();

        let result = self.pipeline(&logger, &request, range, &mut segments, &timeline).await;

        debug!(segments = segments.len(), "Releasing job media");
        for segment in &segments {
            segment.release(self.backend.as_ref()).await;
        }
        self.backend.remove(&timeline).await;

        match &result {
            Ok(path) => {
                metrics::record_job_completed(request.quality.as_str(), started.elapsed().as_secs_f64());
                logger.log_completion(&path.display().to_string());
            }
            Err(e) => {
                let message = e.to_string();
                self.progress
                    .fail(message.clone(), StatusMessage::Failed(&message).render(request.language));
                metrics::record_job_failed(e.kind());
                logger.log_error(&message);
            }
        }

        drop(guard);
        result
    }

    async fn pipeline(
        &self,
        logger: &JobLogger,
        request: &JobRequest,
        range: UnitRange,
        segments: &mut Vec<RenderedSegment>,
        timeline: &Path,
    ) -> WorkerResult<PathBuf> {
        let lang = request.language;

        self.progress.log("[1] Clearing output folders...");
        self.progress.update(5, StatusMessage::Clearing.render(lang));
        for dir in self.config.scratch_dirs() {
            let removed = clear_dir(dir).await?;
            debug!(dir = %dir.display(), removed, "Scratch directory cleared");
        }
        tokio::fs::create_dir_all(&self.config.video_dir).await?;

        let total = range.len();
        self.progress.log(format!(
            "[2] Preparing {} آيات (from {} to {}) with {} quality",
            total, range.start, range.end, request.quality
        ));
        self.progress.update(
            10,
            StatusMessage::PreparingUnits {
                total,
                quality: request.quality,
            }
            .render(lang),
        );

        let sample = self.monitor.sample();
        let workers = worker_count(sample.cpu_percent, sample.mem_percent);
        logger.log_progress(&format!(
            "Using {} parallel workers (CPU: {:.1}%, MEM: {:.1}%)",
            workers, sample.cpu_percent, sample.mem_percent
        ));

        let tasks = request.unit_tasks(range);
        self.dispatch(tasks, request.format.size(), workers, lang, segments).await?;
        segments.sort_by_key(|s| s.sequence_index);

        let runtime: f64 = segments.iter().map(|s| s.duration).sum();
        let advisory = request.format.max_duration_secs();
        if runtime > f64::from(advisory) {
            logger.log_warning(&format!(
                "{:.1}s of audio exceeds the {}s suggested for {}",
                runtime, advisory, request.format
            ));
        }

        self.progress.set_phase(JobPhase::Concatenating);
        self.progress.log("[4] Concatenating segments...");
        self.progress.update(85, StatusMessage::Concatenating.render(lang));
        let paths: Vec<PathBuf> = segments.iter().map(|s| s.video_path.clone()).collect();
        self.backend.concat_segments(&paths, timeline).await?;

        let filename = output_filename(
            &request.person_name,
            Local::now().date_naive(),
            &surah_name(request.surah),
            range,
            request.quality,
            request.template,
            request.format.extension(),
        );
        let output = self.config.video_dir.join(&filename);

        self.progress.set_phase(JobPhase::Writing);
        self.progress.log(format!("[5] Writing final video -> {}", output.display()));
        self.progress.update(90, StatusMessage::Writing.render(lang));
        self.backend.encode_final(timeline, &output, request.quality).await?;

        self.progress.log("[6] Done!");
        self.progress
            .complete(self.relative_output(&output), StatusMessage::Success.render(lang));
        Ok(output)
    }

    /// Run every task, appending finished segments to `segments` as they arrive.
    ///
    /// Stops collecting at the first failure. Units still waiting for a
    /// worker are skipped, units already running are awaited and their
    /// output released before returning, so nothing outlives the job.
    async fn dispatch(
        &self,
        tasks: Vec<UnitTask>,
        canvas: (u32, u32),
        workers: usize,
        lang: Language,
        segments: &mut Vec<RenderedSegment>,
    ) -> WorkerResult<()> {
        let total = tasks.len();
        self.progress.set_phase(JobPhase::Dispatching);

        if workers <= 1 {
            self.progress.set_phase(JobPhase::Collecting);
            for task in &tasks {
                segments.push(self.processor.process(task, canvas).await?);
                self.report_unit(segments.len(), total, lang);
            }
            return Ok(());
        }

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut units = JoinSet::new();
        for task in tasks {
            let processor = self.processor.clone();
            let semaphore = semaphore.clone();
            units.spawn(
                async move {
                    // Closed once the job has failed
                    let Ok(_permit) = semaphore.clone().acquire_owned().await else {
                        return None;
                    };
                    if semaphore.is_closed() {
                        return None;
                    }
                    Some(processor.process(&task, canvas).await)
                }
                .in_current_span(),
            );
        }
        self.progress.set_phase(JobPhase::Collecting);

        let mut failure = None;
        while let Some(joined) = units.join_next().await {
            let result = match joined {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(e) => Err(WorkerError::internal(format!("Verse task aborted: {}", e))),
            };
            match result {
                Ok(segment) if failure.is_none() => {
                    segments.push(segment);
                    self.report_unit(segments.len(), total, lang);
                }
                Ok(segment) => segment.release(self.backend.as_ref()).await,
                Err(e) if failure.is_none() => {
                    semaphore.close();
                    debug!(pending = units.len(), "Waiting for running verses after failure");
                    failure = Some(e);
                }
                Err(e) => debug!(error = %e, "Discarding late verse failure"),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn report_unit(&self, done: usize, total: usize, lang: Language) {
        let percent = 10 + (70 * done / total.max(1)) as u8;
        self.progress
            .update(percent, StatusMessage::Processed { done, total }.render(lang));
    }

    /// Output path as served under the outputs root.
    fn relative_output(&self, output: &Path) -> String {
        output
            .strip_prefix(&self.config.outputs_dir)
            .unwrap_or(output)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FixedSelector;
    use crate::resource::FixedMonitor;
    use crate::unit::testing::{FakeAudio, FakeBackend, FakeText};
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        config: WorkerConfig,
        backend: Arc<FakeBackend>,
        audio: Arc<FakeAudio>,
        controller: JobController,
    }

    fn harness(mem_percent: f32, audio: FakeAudio, backend: FakeBackend) -> Harness {
        let dir = TempDir::new().unwrap();
        let mut config = WorkerConfig::with_base_dir(dir.path());
        config.retry_base_delay = Duration::from_millis(5);
        std::fs::create_dir_all(&config.backgrounds_dir).unwrap();
        std::fs::write(config.backgrounds_dir.join("nature_part1.mp4"), b"bg").unwrap();

        let audio = Arc::new(audio);
        let backend = Arc::new(backend);
        let deps = PipelineDeps {
            audio: audio.clone(),
            text: Arc::new(FakeText),
            backend: backend.clone(),
            monitor: Arc::new(FixedMonitor::new(20.0, mem_percent)),
            selector: Arc::new(FixedSelector(0)),
            fonts: Arc::new(FontCatalog::new(config.fonts_dir.clone())),
        };
        let controller = JobController::new(config.clone(), deps, ProgressStore::new());

        Harness {
            _dir: dir,
            config,
            backend,
            audio,
            controller,
        }
    }

    /// Earlier verses take longer, so completion order is reversed.
    fn inverted_delays(count: u32) -> FakeAudio {
        let delays: HashMap<u32, Duration> = (1..=count)
            .map(|ayah| (ayah, Duration::from_millis(u64::from(count - ayah + 1) * 20)))
            .collect();
        FakeAudio {
            delays,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_segment_order_for_every_pool_size() {
        // 90% -> 1 worker, 60% -> 2, 10% -> 3
        for mem in [90.0, 60.0, 10.0] {
            let h = harness(mem, inverted_delays(5), FakeBackend::default());
            let request = JobRequest::new("Alafasy_64kbps", 1, 1, Some(5));

            h.controller.run(request).await.unwrap();

            let order: Vec<String> = h
                .backend
                .concatenated
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect();
            assert_eq!(
                order,
                vec![
                    "segment_001.mp4",
                    "segment_002.mp4",
                    "segment_003.mp4",
                    "segment_004.mp4",
                    "segment_005.mp4"
                ],
                "mem {}",
                mem
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_job_state_and_output() {
        let h = harness(10.0, FakeAudio::default(), FakeBackend::default());
        let request = JobRequest::new("Alafasy_64kbps", 112, 1, None).with_person_name("A/B C");

        let output = h.controller.run(request).await.unwrap();

        let state = h.controller.progress().snapshot();
        assert!(state.is_complete);
        assert!(!state.is_running);
        assert_eq!(state.percent, 100);
        assert_eq!(state.phase, JobPhase::Complete);
        assert!(state.error.is_none());
        assert_eq!(state.log.first().map(String::as_str), Some("[1] Clearing output folders..."));
        assert_eq!(state.log.last().map(String::as_str), Some("[6] Done!"));

        let name = output.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("A_B_C_"));
        assert!(name.ends_with("_الإخلاص_Ayah1-4_medium_normal.mp4"));
        assert_eq!(state.output_path, Some(format!("video/{}", name)));
        assert_eq!(
            tokio::fs::read_to_string(&output).await.unwrap(),
            "audio-1|audio-2|audio-3|audio-4|"
        );

        let encoded = h.backend.encoded.lock().unwrap().clone();
        assert_eq!(encoded, vec![(output.clone(), QualityPreset::Medium)]);

        // segments and timeline are released, the artifact and cache are kept
        let leftovers: Vec<_> = std::fs::read_dir(&h.config.segments_dir).unwrap().collect();
        assert!(leftovers.is_empty());
        assert_eq!(std::fs::read_dir(&h.config.audio_dir).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(&h.config.bg_cache_dir).unwrap().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_units_match_range() {
        for (start, end, expected) in [(1, Some(7), 7), (5, None, 3), (3, Some(1), 1), (0, Some(2), 2)] {
            let h = harness(10.0, FakeAudio::default(), FakeBackend::default());
            let request = JobRequest::new("Husary_64kbps", 1, start, end);

            h.controller.run(request).await.unwrap();

            assert_eq!(h.audio.calls.load(Ordering::SeqCst), expected, "{}..{:?}", start, end);
            assert_eq!(h.backend.concatenated.lock().unwrap().len(), expected as usize);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unit_failure_fails_job_and_clears_running() {
        for mem in [90.0, 10.0] {
            let audio = FakeAudio {
                always_fail: true,
                ..Default::default()
            };
            let h = harness(mem, audio, FakeBackend::default());
            let request = JobRequest::new("Alafasy_64kbps", 1, 1, Some(3)).with_language(Language::En);

            let err = h.controller.run(request).await.unwrap_err();
            assert!(matches!(err, WorkerError::Fetch(_)));

            let state = h.controller.progress().snapshot();
            assert!(!state.is_running);
            assert!(!state.is_complete);
            assert_eq!(state.percent, 0);
            assert_eq!(state.phase, JobPhase::Errored);
            assert!(state.status.starts_with("Error: Fetch failed"));
            assert!(state.error.as_deref().unwrap().contains("503"));
            assert!(state.log.iter().any(|l| l.starts_with("Retry 1/3 for audio 1:")));
            assert!(state.log.last().unwrap().starts_with("[ERROR]"));
            assert!(h.backend.concatenated.lock().unwrap().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_compose_failure_releases_partial_results() {
        let backend = FakeBackend {
            fail_compose: true,
            ..Default::default()
        };
        let h = harness(10.0, FakeAudio::default(), backend);

        let err = h
            .controller
            .run(JobRequest::new("x", 1, 1, Some(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Compose(_)));

        // let the remaining units drain
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!h.controller.progress().is_running());
        assert_eq!(std::fs::read_dir(&h.config.audio_dir).unwrap().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_waits_for_running_units() {
        let mut audio = inverted_delays(3);
        audio.delays.insert(2, Duration::ZERO);
        audio.delays.insert(3, Duration::from_millis(100));
        audio.failing_ayah.store(2, Ordering::SeqCst);
        let h = harness(10.0, audio, FakeBackend::default());

        let err = h
            .controller
            .run(JobRequest::new("Alafasy_64kbps", 1, 1, Some(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Fetch(_)));

        // verses 1 and 3 finished before the job returned, and were released
        assert_eq!(h.backend.composed.lock().unwrap().len(), 2);
        assert_eq!(std::fs::read_dir(&h.config.audio_dir).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(&h.config.segments_dir).unwrap().count(), 0);
        let calls = h.audio.calls.load(Ordering::SeqCst);

        // the next job owns the scratch dirs and the progress log alone
        h.audio.failing_ayah.store(0, Ordering::SeqCst);
        let output = h
            .controller
            .run(JobRequest::new("Alafasy_64kbps", 1, 1, Some(2)))
            .await
            .unwrap();
        assert_eq!(
            tokio::fs::read_to_string(&output).await.unwrap(),
            "audio-1|audio-2|"
        );
        assert_eq!(h.audio.calls.load(Ordering::SeqCst), calls + 2);

        let state = h.controller.progress().snapshot();
        assert!(state.is_complete);
        assert!(!state.log.iter().any(|l| l.starts_with("Retry")));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.audio.calls.load(Ordering::SeqCst), calls + 2);
    }

    #[tokio::test]
    async fn test_submit_rejected_while_running() {
        let h = harness(10.0, FakeAudio::default(), FakeBackend::default());
        let guard = h.controller.progress().try_start("busy").unwrap();
        h.controller.progress().update(42, "working");
        let before = h.controller.progress().snapshot();

        let err = h
            .controller
            .submit(JobRequest::new("x", 1, 1, Some(2)))
            .unwrap_err();

        assert!(matches!(err, WorkerError::AlreadyRunning));
        assert_eq!(h.controller.progress().snapshot(), before);
        drop(guard);
    }

    #[tokio::test]
    async fn test_invalid_surah_rejected_without_state_change() {
        let h = harness(10.0, FakeAudio::default(), FakeBackend::default());
        let before = h.controller.progress().snapshot();

        let err = h
            .controller
            .submit(JobRequest::new("x", 115, 1, None))
            .unwrap_err();

        assert!(matches!(err, WorkerError::InvalidRequest(_)));
        assert_eq!(h.controller.progress().snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_after_completion_resets_state() {
        let h = harness(10.0, FakeAudio::default(), FakeBackend::default());
        h.controller.run(JobRequest::new("x", 1, 1, Some(2))).await.unwrap();
        assert!(h.controller.progress().snapshot().is_complete);

        h.controller.submit(JobRequest::new("x", 1, 3, Some(4))).unwrap();
        let fresh = h.controller.progress().snapshot();
        assert!(fresh.is_running);
        assert!(!fresh.is_complete);
        assert_eq!(fresh.percent, 0);
        assert!(fresh.error.is_none());
        assert!(fresh.log.is_empty());

        while h.controller.progress().is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let done = h.controller.progress().snapshot();
        assert!(done.is_complete);
        assert!(done.output_path.unwrap().contains("Ayah3-4"));
    }

    #[test]
    fn test_preview_request() {
        let request = preview_request("Husary_64kbps", 36, 58, Template::Kids);
        assert_eq!(request.resolve_range().unwrap(), UnitRange { start: 58, end: 58 });
        assert_eq!(request.quality, QualityPreset::Low);
        assert_eq!(request.format, OutputFormat::Reels);
        assert_eq!(request.template, Template::Kids);
    }
}
