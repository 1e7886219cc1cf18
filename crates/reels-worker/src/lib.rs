//! Verse reels job orchestration.
//!
//! This crate provides:
//! - Single-job controller with a resource-sized worker pool
//! - Per-verse unit pipeline with retried fetch and preprocessing steps
//! - Derived background cache shared across jobs
//! - Progress store read by the HTTP layer
//! - Pluggable media backend, sources and asset selection

pub mod assets;
pub mod backend;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod resource;
pub mod retry;
pub mod unit;

pub use assets::{AssetSelector, BackgroundCatalog, FixedSelector, FontCatalog, RandomSelector, FALLBACK_FONT};
pub use backend::{ComposeRequest, FfmpegBackend, MediaBackend};
pub use cache::DerivedAssetCache;
pub use config::WorkerConfig;
pub use controller::{preview_request, JobController, PipelineDeps};
pub use error::{WorkerError, WorkerResult};
pub use fetch::{build_http_client, AudioSource, HttpAudioSource, HttpTextSource, TextSource};
pub use logging::JobLogger;
pub use progress::{ProgressStore, RunningGuard};
pub use resource::{worker_count, FixedMonitor, ResourceMonitor, ResourceSample, SystemMonitor};
pub use retry::{RetryEvent, RetryExecutor};
pub use unit::{RenderedSegment, UnitProcessor};
