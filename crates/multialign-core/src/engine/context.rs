use super::config::{AlignmentConfig, BatchConfig, FailurePolicy};
use super::progress::ProgressReporter;
use super::work_list::WorkList;
use crate::core::models::structure::Structure;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only state shared by every worker during a batch run.
///
/// The only mutable piece is the cancellation flag, which is atomic so the
/// context can be borrowed across threads.
pub struct AlignmentContext<'a> {
    pub reference: &'a Structure,
    pub work_list: &'a WorkList,
    pub config: &'a BatchConfig,
    pub reporter: &'a ProgressReporter<'a>,
    /// Slices per coordinate update, already bounded by the core budget.
    pub numeric_threads: usize,
    cancelled: AtomicBool,
}

impl<'a> AlignmentContext<'a> {
    pub fn new(
        reference: &'a Structure,
        work_list: &'a WorkList,
        config: &'a BatchConfig,
        reporter: &'a ProgressReporter<'a>,
        numeric_threads: usize,
    ) -> Self {
        Self {
            reference,
            work_list,
            config,
            reporter,
            numeric_threads,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn alignment(&self) -> &AlignmentConfig {
        &self.config.alignment
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Records a failed target; under fail-fast this stops unstarted targets.
    pub fn note_failure(&self) {
        if self.config.failure_policy == FailurePolicy::FailFast {
            self.cancelled.store(true, Ordering::Relaxed);
        }
    }
}
