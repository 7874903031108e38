//! Cooperative cancellation and deadlines for long-running searches.
//!
//! Algorithms call [`SearchBudget::check`] between major loop iterations; the
//! first failing check aborts the search with `Cancelled` or
//! `DeadlineExceeded`.

use crate::error::{PlannerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle used from another thread to stop a running search
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct SearchBudget {
    started: Instant,
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        SearchBudget {
            started: Instant::now(),
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let started = Instant::now();
        SearchBudget {
            started,
            deadline: Some(started + timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Budget from an optional timeout in milliseconds
    pub fn from_millis(timeout_ms: Option<u64>) -> Self {
        match timeout_ms {
            Some(ms) => Self::with_timeout(Duration::from_millis(ms)),
            None => Self::unlimited(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(PlannerError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(PlannerError::DeadlineExceeded {
                    elapsed_ms: self.started.elapsed().as_millis(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget_passes() {
        assert!(SearchBudget::unlimited().check().is_ok());
    }

    #[test]
    fn test_cancel_handle_stops_search() {
        let budget = SearchBudget::unlimited();
        let handle = budget.cancel_handle();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(matches!(budget.check(), Err(PlannerError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline() {
        let budget = SearchBudget::with_timeout(Duration::ZERO);
        assert!(matches!(budget.check(), Err(PlannerError::DeadlineExceeded { .. })));
    }
}
