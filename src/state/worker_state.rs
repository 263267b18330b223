//! Worker state definitions for the crawl loop
//!
//! Each worker moves through these states once per URL; `Stopped` is terminal.

use crate::CrawlError;
use std::fmt;

/// Represents the current state of one crawl worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Between iterations; about to check the stop signal and budget
    Idle,

    /// Waiting (bounded) on the frontier for the next URL
    Dequeuing,

    /// Fetching a URL through the politeness gate
    Fetching,

    /// Extracting, storing, logging, and enqueueing discovered links
    Processing,

    /// Terminal: the worker has left its loop
    Stopped,
}

impl WorkerState {
    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;

        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Idle, Dequeuing) => true,
            (Dequeuing, Idle) | (Dequeuing, Fetching) => true,
            (Fetching, Processing) => true,
            (Processing, Idle) => true,
            _ => false,
        }
    }

    /// Performs a transition, rejecting illegal ones
    pub fn transition(self, next: WorkerState) -> Result<WorkerState, CrawlError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dequeuing => "dequeuing",
            Self::Fetching => "fetching",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WorkerState; 5] = [
        WorkerState::Idle,
        WorkerState::Dequeuing,
        WorkerState::Fetching,
        WorkerState::Processing,
        WorkerState::Stopped,
    ];

    #[test]
    fn test_happy_path() {
        let state = WorkerState::Idle
            .transition(WorkerState::Dequeuing)
            .and_then(|s| s.transition(WorkerState::Fetching))
            .and_then(|s| s.transition(WorkerState::Processing))
            .and_then(|s| s.transition(WorkerState::Idle))
            .unwrap();
        assert_eq!(state, WorkerState::Idle);
    }

    #[test]
    fn test_empty_dequeue_returns_to_idle() {
        assert!(WorkerState::Dequeuing.can_transition_to(WorkerState::Idle));
    }

    #[test]
    fn test_any_state_can_stop() {
        for state in ALL.iter().filter(|s| **s != WorkerState::Stopped) {
            assert!(state.can_transition_to(WorkerState::Stopped), "{}", state);
        }
    }

    #[test]
    fn test_stopped_is_terminal() {
        for next in ALL {
            assert!(!WorkerState::Stopped.can_transition_to(next));
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!WorkerState::Idle.can_transition_to(WorkerState::Fetching));
        assert!(!WorkerState::Fetching.can_transition_to(WorkerState::Idle));
        assert!(!WorkerState::Processing.can_transition_to(WorkerState::Fetching));

        let err = WorkerState::Idle.transition(WorkerState::Processing);
        assert!(matches!(
            err,
            Err(CrawlError::InvalidTransition {
                from: WorkerState::Idle,
                to: WorkerState::Processing
            })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", WorkerState::Dequeuing), "dequeuing");
        assert_eq!(format!("{}", WorkerState::Stopped), "stopped");
    }
}
