//! Shared data models for the verse reels renderer.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and per-verse unit tasks
//! - Quality presets, output formats and visual templates
//! - The surah/reciter catalog
//! - Progress state exposed to the HTTP layer
//! - Output filename derivation and text layout tiers

pub mod catalog;
pub mod error;
pub mod filename;
pub mod job;
pub mod presets;
pub mod progress;
pub mod status_text;
pub mod text_style;

// Re-export common types
pub use catalog::{reciters, surah_name, surah_names, verse_count, verse_counts, SURAH_COUNT};
pub use error::{ModelError, ModelResult};
pub use filename::{output_filename, sanitize_label};
pub use job::{JobId, JobRequest, Language, UnitRange, UnitTask};
pub use presets::{BackgroundStyle, OutputFormat, QualityPreset, Template, TextColor};
pub use progress::{JobPhase, ProgressState};
pub use status_text::StatusMessage;
pub use text_style::{wrap_words, TextStyle};
