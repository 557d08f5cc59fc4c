//! Run deadline and cancellation
//!
//! The coordinator checks the deadline between scenarios only. Work that has
//! already started always runs to completion.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// When a run must stop starting new scenarios
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels the [`Deadline`] it was created with
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Deadline {
    /// No time limit and no cancellation
    pub fn none() -> Self {
        Self::default()
    }

    /// Expire `budget` from now, or never if that instant cannot be
    /// represented
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
            cancel: None,
        }
    }

    /// Attach a cancellation handle
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    /// Why the run must stop, if it must
    pub fn check(&self) -> Option<String> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some("cancelled".to_string());
        }
        match self.at {
            Some(at) if Instant::now() >= at => Some("deadline exceeded".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_triggers() {
        assert_eq!(Deadline::none().check(), None);
    }

    #[tokio::test]
    async fn test_elapsed_deadline() {
        let deadline = Deadline::after(Duration::ZERO);
        assert_eq!(deadline.check().as_deref(), Some("deadline exceeded"));
        assert_eq!(Deadline::after(Duration::from_secs(60)).check(), None);
    }

    #[tokio::test]
    async fn test_unrepresentable_budget_never_expires() {
        assert_eq!(Deadline::after(Duration::MAX).check(), None);
    }

    #[test]
    fn test_cancel_handle() {
        let (deadline, handle) = Deadline::none().cancellable();
        let copy = deadline.clone();
        assert_eq!(deadline.check(), None);
        handle.cancel();
        assert_eq!(deadline.check().as_deref(), Some("cancelled"));
        assert_eq!(copy.check().as_deref(), Some("cancelled"));
    }
}
