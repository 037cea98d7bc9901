//! Cooperative cancellation for time-boxed searches.
//!
//! A search polls [`SearchBudget::check`] once per visited node. When the
//! budget runs out the search unwinds with [`SearchCancelled`], taking back
//! every move it applied on the way.

use crate::error::{CancelReason, SearchCancelled};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Raises the stop flag of the budget it came from, from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct SearchBudget {
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    stop: Arc<AtomicBool>,
    nodes: AtomicU64,
    tripped: AtomicBool,
}

impl SearchBudget {
    /// A budget that never runs out unless stopped.
    pub fn unlimited() -> Self {
        SearchBudget {
            deadline: None,
            node_limit: None,
            stop: Arc::new(AtomicBool::new(false)),
            nodes: AtomicU64::new(0),
            tripped: AtomicBool::new(false),
        }
    }

    /// Runs out `limit` after now.
    pub fn with_time_limit(limit: Duration) -> Self {
        Self::unlimited().deadline(Instant::now() + limit)
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs out once more than `limit` nodes have been checked.
    pub fn node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Counts one node and fails if any limit has been reached. Once it has
    /// failed it keeps failing.
    pub fn check(&self) -> Result<(), SearchCancelled> {
        if self.tripped.load(Ordering::Relaxed) {
            return Err(SearchCancelled(self.reason()));
        }
        let nodes = self.nodes.fetch_add(1, Ordering::Relaxed) + 1;

        let reason = if self.stop.load(Ordering::Relaxed) {
            Some(CancelReason::Stopped)
        } else if self.node_limit.is_some_and(|limit| nodes > limit) {
            Some(CancelReason::NodeLimit)
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(CancelReason::Deadline)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                self.tripped.store(true, Ordering::Relaxed);
                Err(SearchCancelled(reason))
            }
            None => Ok(()),
        }
    }

    // Recomputed after tripping; the conditions that tripped it stay true.
    fn reason(&self) -> CancelReason {
        if self.stop.load(Ordering::Relaxed) {
            CancelReason::Stopped
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            CancelReason::Deadline
        } else {
            CancelReason::NodeLimit
        }
    }

    /// Nodes counted so far.
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.tripped.load(Ordering::Relaxed)
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
