//! Progress snapshot exposed to callers while a job runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No job has been submitted yet
    #[default]
    Idle,
    /// Range resolution, pool sizing and task planning
    Preparing,
    /// Units are being handed to workers
    Dispatching,
    /// Waiting for unit results
    Collecting,
    /// Splicing segments into one timeline
    Concatenating,
    /// Encoding the final artifact
    Writing,
    Complete,
    Errored,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Preparing => "preparing",
            JobPhase::Dispatching => "dispatching",
            JobPhase::Collecting => "collecting",
            JobPhase::Concatenating => "concatenating",
            JobPhase::Writing => "writing",
            JobPhase::Complete => "complete",
            JobPhase::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Complete | JobPhase::Errored)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobPhase) -> bool {
        use JobPhase::*;
        match (self, next) {
            (Idle | Complete | Errored, Preparing) => true,
            (Preparing, Dispatching) => true,
            (Dispatching, Collecting) => true,
            (Collecting, Concatenating) => true,
            (Concatenating, Writing) => true,
            (Writing, Complete) => true,
            (Idle, Errored) => false,
            (from, Errored) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the single active job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProgressState {
    /// Completion percentage (0-100)
    pub percent: u8,
    /// Latest user-facing status message
    pub status: String,
    /// Append-only log of phase transitions and retries
    pub log: Vec<String>,
    pub is_running: bool,
    pub is_complete: bool,
    /// Path of the written artifact, relative to the outputs dir
    pub output_path: Option<String>,
    pub error: Option<String>,
    pub phase: JobPhase,
}

impl ProgressState {
    /// Fresh state for a just-accepted job.
    pub fn started(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            is_running: true,
            phase: JobPhase::Preparing,
            ..Self::default()
        }
    }
}
