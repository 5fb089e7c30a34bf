//! # Tri-state outcome cell for one managed instance.
//!
//! A [`Status`] starts [`State::Unknown`] and is set to success or failure
//! when the instance's execution unit exits. Clones share one cell, so the
//! supervisor's per-launch records observe the slot's current outcome
//! without pruning.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const UNKNOWN: u8 = 0;
const SUCCESS: u8 = 1;
const FAILURE: u8 = 2;

/// Outcome of one instance execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The unit has not exited yet (or was just relaunched).
    Unknown,
    /// The unit exited cleanly.
    Success,
    /// The unit exited with a failure.
    Failure,
}

/// Shared tri-state status cell.
///
/// Cloning yields another handle to the same cell.
#[derive(Clone, Debug)]
pub struct Status {
    cell: Arc<AtomicU8>,
}

impl Status {
    /// Creates a fresh cell in the [`State::Unknown`] state.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(UNKNOWN)),
        }
    }

    /// Records a clean exit.
    pub fn succeed(&self) {
        self.cell.store(SUCCESS, Ordering::SeqCst);
    }

    /// Records a failed exit.
    pub fn fail(&self) {
        self.cell.store(FAILURE, Ordering::SeqCst);
    }

    /// Re-arms the cell for a relaunch of the same slot.
    pub(crate) fn reset(&self) {
        self.cell.store(UNKNOWN, Ordering::SeqCst);
    }

    /// Current state.
    pub fn state(&self) -> State {
        match self.cell.load(Ordering::SeqCst) {
            SUCCESS => State::Success,
            FAILURE => State::Failure,
            _ => State::Unknown,
        }
    }

    /// True when the last exit was clean.
    pub fn is_success(&self) -> bool {
        self.state() == State::Success
    }

    /// True when the last exit failed.
    pub fn is_failure(&self) -> bool {
        self.state() == State::Failure
    }

    /// True when no exit has been recorded since the last launch.
    pub fn is_unknown(&self) -> bool {
        self.state() == State::Unknown
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_transitions() {
        let status = Status::new();
        assert!(status.is_unknown());
        status.fail();
        assert!(status.is_failure());
        status.reset();
        assert!(status.is_unknown());
        status.succeed();
        assert!(status.is_success());
    }

    #[test]
    fn clones_share_the_cell() {
        let status = Status::new();
        let handle = status.clone();
        status.succeed();
        assert!(handle.is_success());
        assert_eq!(handle.state(), State::Success);
    }
}
