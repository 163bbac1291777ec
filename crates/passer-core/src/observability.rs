use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::Outcome;

/// Snapshot of execute outcomes since the registry was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionCounts {
    pub completed: usize,
    pub handler_failed: usize,
    pub canceled: usize,
    pub deadline_exceeded: usize,
    pub rejected: usize,
    pub panicked: usize,
}

impl ExecutionCounts {
    pub fn total(&self) -> usize {
        self.completed
            + self.handler_failed
            + self.canceled
            + self.deadline_exceeded
            + self.rejected
            + self.panicked
    }
}

/// Lock-free counters updated once per execute call.
#[derive(Debug, Default)]
pub(crate) struct OutcomeCounters {
    completed: AtomicUsize,
    handler_failed: AtomicUsize,
    canceled: AtomicUsize,
    deadline_exceeded: AtomicUsize,
    rejected: AtomicUsize,
    panicked: AtomicUsize,
}

impl OutcomeCounters {
    pub(crate) fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Completed => &self.completed,
            Outcome::HandlerFailed => &self.handler_failed,
            Outcome::Canceled => &self.canceled,
            Outcome::DeadlineExceeded => &self.deadline_exceeded,
            Outcome::Rejected => &self.rejected,
            Outcome::Panicked => &self.panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutionCounts {
        ExecutionCounts {
            completed: self.completed.load(Ordering::Relaxed),
            handler_failed: self.handler_failed.load(Ordering::Relaxed),
            canceled: self.canceled.load(Ordering::Relaxed),
            deadline_exceeded: self.deadline_exceeded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_outcome_once() {
        let counters = OutcomeCounters::default();
        counters.record(Outcome::Completed);
        counters.record(Outcome::Completed);
        counters.record(Outcome::DeadlineExceeded);
        counters.record(Outcome::Rejected);

        let snap = counters.snapshot();
        assert_eq!(snap.completed, 2);
        assert_eq!(snap.deadline_exceeded, 1);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.total(), 4);
    }
}
