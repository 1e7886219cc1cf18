//! Shared progress state for the single active job.
//!
//! One writer (the running job) and any number of readers. Readers always
//! get a full clone taken under the read lock, never a torn state.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use reels_models::{JobPhase, ProgressState};

use crate::error::{WorkerError, WorkerResult};

/// Handle to the process-wide progress state.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    inner: Arc<RwLock<ProgressState>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the store for a new job.
    ///
    /// Fails with [`WorkerError::AlreadyRunning`] without touching the state
    /// when a job is in flight; otherwise resets everything in the same
    /// critical section. Dropping the guard clears `is_running`.
    pub fn try_start(&self, status: impl Into<String>) -> WorkerResult<RunningGuard> {
        let mut state = self.write_lock();
        if state.is_running {
            return Err(WorkerError::AlreadyRunning);
        }
        *state = ProgressState::started(status);
        Ok(RunningGuard { store: self.clone() })
    }

    pub fn snapshot(&self) -> ProgressState {
        self.read_lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.read_lock().is_running
    }

    /// Append a line to the job log.
    pub fn log(&self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "reels::progress", "{}", line);
        self.write_lock().log.push(line);
    }

    pub fn update(&self, percent: u8, status: impl Into<String>) {
        let status = status.into();
        let percent = percent.min(100);
        info!(target: "reels::progress", percent, status = %status, "Progress");
        let mut state = self.write_lock();
        state.percent = percent;
        state.status = status;
    }

    /// Move to `phase` if the state machine allows it.
    pub fn set_phase(&self, phase: JobPhase) {
        let mut state = self.write_lock();
        if state.phase.can_transition_to(phase) {
            state.phase = phase;
        } else {
            warn!(from = %state.phase, to = %phase, "Ignoring invalid phase transition");
        }
    }

    /// Record the written artifact.
    pub fn complete(&self, output_path: impl Into<String>, status: impl Into<String>) {
        let mut state = self.write_lock();
        if state.phase.can_transition_to(JobPhase::Complete) {
            state.phase = JobPhase::Complete;
        }
        state.percent = 100;
        state.status = status.into();
        state.is_complete = true;
        state.output_path = Some(output_path.into());
    }

    /// Record a fatal error. Percent goes back to 0.
    pub fn fail(&self, message: impl Into<String>, status: impl Into<String>) {
        let message = message.into();
        let mut state = self.write_lock();
        if state.phase.can_transition_to(JobPhase::Errored) {
            state.phase = JobPhase::Errored;
        }
        state.percent = 0;
        state.status = status.into();
        state.log.push(format!("[ERROR] {}", message));
        state.error = Some(message);
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, ProgressState> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, ProgressState> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Held by the running job; releases the store on drop.
#[derive(Debug)]
#[must_use = "dropping the guard ends the job"]
pub struct RunningGuard {
    store: ProgressStore,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.store.write_lock().is_running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_while_running_leaves_state_untouched() {
        let store = ProgressStore::new();
        let guard = store.try_start("first").unwrap();
        store.update(40, "halfway");
        store.log("[1] Clearing output folders...");
        let before = store.snapshot();

        let err = store.try_start("second").unwrap_err();
        assert!(matches!(err, WorkerError::AlreadyRunning));
        assert_eq!(store.snapshot(), before);

        drop(guard);
        assert!(!store.is_running());
    }

    #[test]
    fn test_restart_after_completion_resets() {
        let store = ProgressStore::new();
        {
            let _guard = store.try_start("go").unwrap();
            store.set_phase(JobPhase::Dispatching);
            store.set_phase(JobPhase::Collecting);
            store.set_phase(JobPhase::Concatenating);
            store.set_phase(JobPhase::Writing);
            store.log("line");
            store.complete("video/out.mp4", "done");
        }
        let done = store.snapshot();
        assert!(done.is_complete && !done.is_running);
        assert_eq!(done.phase, JobPhase::Complete);

        let _guard = store.try_start("again").unwrap();
        let fresh = store.snapshot();
        assert_eq!(fresh.percent, 0);
        assert!(!fresh.is_complete);
        assert!(fresh.error.is_none());
        assert!(fresh.log.is_empty());
        assert!(fresh.output_path.is_none());
        assert!(fresh.is_running);
    }

    #[test]
    fn test_fail_resets_percent_and_logs() {
        let store = ProgressStore::new();
        let guard = store.try_start("go").unwrap();
        store.update(55, "working");
        store.fail("Fetch failed: 404", "Error: Fetch failed: 404");
        drop(guard);

        let state = store.snapshot();
        assert_eq!(state.percent, 0);
        assert_eq!(state.phase, JobPhase::Errored);
        assert_eq!(state.error.as_deref(), Some("Fetch failed: 404"));
        assert_eq!(state.log.last().map(String::as_str), Some("[ERROR] Fetch failed: 404"));
        assert!(!state.is_running);
    }

    #[test]
    fn test_invalid_phase_transition_is_ignored() {
        let store = ProgressStore::new();
        let _guard = store.try_start("go").unwrap();
        store.set_phase(JobPhase::Writing);
        assert_eq!(store.snapshot().phase, JobPhase::Preparing);
    }

    #[test]
    fn test_percent_is_clamped() {
        let store = ProgressStore::new();
        store.update(250, "x");
        assert_eq!(store.snapshot().percent, 100);
    }
}
