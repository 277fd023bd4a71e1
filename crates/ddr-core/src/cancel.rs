//! Cancellation and deadline signal for backend operations.
//!
//! Fetch and release go over the network with no natural bound, so every
//! reconciliation pass carries a [`CancelSignal`]: a shared flag that any
//! clone can raise, plus an optional wall-clock deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why an operation was stopped before it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interrupted::Cancelled => write!(f, "Operation was cancelled"),
            Interrupted::DeadlineExceeded => write!(f, "Deadline exceeded"),
        }
    }
}

impl std::error::Error for Interrupted {}

impl From<Interrupted> for crate::error::DdrError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => crate::error::DdrError::Cancelled,
            Interrupted::DeadlineExceeded => crate::error::DdrError::DeadlineExceeded,
        }
    }
}

/// Cooperative cancellation flag with an optional deadline.
///
/// Clones share the flag; the deadline is copied.
///
/// ```
/// use ddr_core::cancel::CancelSignal;
/// use std::time::Duration;
///
/// let signal = CancelSignal::with_timeout(Duration::from_secs(60));
/// let worker = signal.clone();
/// assert!(worker.check().is_ok());
/// signal.cancel();
/// assert!(worker.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that also expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Same flag, different deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            cancelled: self.cancelled.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail fast if the operation should not start.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            Err(Interrupted::Cancelled)
        } else if self.is_expired() {
            Err(Interrupted::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_signal_is_clear() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());
        assert!(!signal.is_expired());
        assert!(signal.remaining().is_none());
        assert!(signal.check().is_ok());
    }

    #[test]
    fn test_clone_shares_flag() {
        let a = CancelSignal::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
        assert_eq!(a.check(), Err(Interrupted::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let signal = CancelSignal::new().with_deadline(Instant::now());
        assert!(signal.is_expired());
        assert_eq!(signal.check(), Err(Interrupted::DeadlineExceeded));
        assert_eq!(signal.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let signal = CancelSignal::with_timeout(Duration::ZERO);
        signal.cancel();
        assert_eq!(signal.check(), Err(Interrupted::Cancelled));
    }

    #[test]
    fn test_interrupted_into_error() {
        let err: crate::error::DdrError = Interrupted::DeadlineExceeded.into();
        assert!(matches!(err, crate::error::DdrError::DeadlineExceeded));
    }
}
