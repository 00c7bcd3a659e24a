//! Cooperative run control for long computations
//!
//! Monte Carlo runs and optimizer loops poll a [`RunControl`] between units of
//! work. A stop is never an error by itself: the computation returns what it
//! finished, labelled [`Completion::Incomplete`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Shared flag a caller flips to abandon a running computation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Counter of finished work units, readable from another thread.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    done: Arc<AtomicUsize>,
}

impl Progress {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units finished so far.
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Record one finished unit.
    pub fn tick(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset to zero before a new run.
    pub fn reset(&self) {
        self.done.store(0, Ordering::Relaxed);
    }
}

/// Why a run stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The deadline passed
    DeadlineExceeded,
    /// The cancellation token was triggered
    Cancelled,
}

/// Whether a result covers all requested work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    /// Every requested unit finished
    Complete,
    /// The run stopped early
    Incomplete {
        /// Units finished
        completed: usize,
        /// Units requested
        requested: usize,
        /// Why the run stopped
        reason: StopReason,
    },
}

impl Completion {
    /// Whether the result is complete.
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Deadline, cancellation and progress reporting for one computation.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    deadline: Option<Instant>,
    token: Option<CancellationToken>,
    progress: Option<Progress>,
}

impl RunControl {
    /// No deadline, not cancellable.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Stop once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Stop at an absolute instant.
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Report finished units to `progress`.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Reason to stop now, if any. Cancellation wins over the deadline.
    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(StopReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(StopReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether work should stop.
    pub fn should_stop(&self) -> bool {
        self.stop_reason().is_some()
    }

    /// Record one finished unit of work.
    pub fn tick(&self) {
        if let Some(progress) = &self.progress {
            progress.tick();
        }
    }

    /// Classify a finished run.
    pub fn completion(&self, completed: usize, requested: usize) -> Completion {
        if completed >= requested {
            return Completion::Complete;
        }
        Completion::Incomplete {
            completed,
            requested,
            reason: self.stop_reason().unwrap_or(StopReason::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_stops() {
        let control = RunControl::unbounded();
        assert!(!control.should_stop());
        assert_eq!(control.completion(10, 10), Completion::Complete);
    }

    #[test]
    fn test_cancellation() {
        let token = CancellationToken::new();
        let control = RunControl::unbounded().with_cancellation(token.clone());
        assert!(!control.should_stop());
        token.cancel();
        assert_eq!(control.stop_reason(), Some(StopReason::Cancelled));
        assert_eq!(
            control.completion(3, 10),
            Completion::Incomplete {
                completed: 3,
                requested: 10,
                reason: StopReason::Cancelled
            }
        );
    }

    #[test]
    fn test_expired_deadline() {
        let control = RunControl::unbounded().with_timeout(Duration::ZERO);
        assert_eq!(control.stop_reason(), Some(StopReason::DeadlineExceeded));
        assert!(!control.completion(0, 5).is_complete());
    }

    #[test]
    fn test_progress_ticks() {
        let progress = Progress::new();
        let control = RunControl::unbounded().with_progress(progress.clone());
        control.tick();
        control.tick();
        assert_eq!(progress.completed(), 2);
        progress.reset();
        assert_eq!(progress.completed(), 0);
    }

    #[test]
    fn test_completion_serializes_with_status_tag() {
        let json = serde_json::to_string(&Completion::Complete).unwrap();
        assert_eq!(json, r#"{"status":"complete"}"#);
    }
}
