use super::config::ConfigError;
use std::num::NonZeroUsize;
use std::ops::Range;
use tracing::warn;

/// How many worker threads the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerRequest {
    /// Use every available core.
    #[default]
    Auto,
    Exact(NonZeroUsize),
}

impl WorkerRequest {
    /// The raw value that selects [`WorkerRequest::Auto`].
    pub const AUTO: i64 = -1;

    /// Interprets a raw thread count: `-1` means all cores, positive values are exact.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreadCount`] for zero and for negative values
    /// other than `-1`.
    pub fn from_raw(raw: i64) -> Result<Self, ConfigError> {
        if raw == Self::AUTO {
            return Ok(Self::Auto);
        }
        usize::try_from(raw)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self::Exact)
            .ok_or(ConfigError::InvalidThreadCount(raw))
    }
}

/// Number of cores this process may use, never less than one.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Turns a request into a concrete worker count bounded by `available`.
///
/// An explicit request above `available` is clamped with a warning.
pub fn resolve_worker_count(request: WorkerRequest, available: usize) -> usize {
    let available = available.max(1);
    match request {
        WorkerRequest::Auto => available,
        WorkerRequest::Exact(n) if n.get() > available => {
            warn!(
                requested = n.get(),
                available, "Requested more workers than available cores; clamping."
            );
            available
        }
        WorkerRequest::Exact(n) => n.get(),
    }
}

/// Bounds the per-task numeric threads so that `workers * numeric <= available`.
///
/// The result is never below one, even when the workers alone use every core.
pub fn resolve_numeric_threads(requested: NonZeroUsize, workers: usize, available: usize) -> usize {
    let budget = (available.max(1) / workers.max(1)).max(1);
    if requested.get() > budget {
        warn!(
            requested = requested.get(),
            workers,
            available,
            using = budget,
            "Reducing numeric threads per task to avoid oversubscription."
        );
        budget
    } else {
        requested.get()
    }
}

/// Splits target indices `1..=n_targets` into at most `workers` contiguous ranges.
///
/// Ranges differ in length by at most one, earlier ranges take the remainder,
/// and no range is empty. Index 0 is the reference and never appears.
pub fn partition_targets(n_targets: usize, workers: usize) -> Vec<Range<usize>> {
    let parts = workers.max(1).min(n_targets);
    if parts == 0 {
        return Vec::new();
    }

    let base = n_targets / parts;
    let remainder = n_targets % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 1;
    for i in 0..parts {
        let len = base + usize::from(i < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(n: usize) -> WorkerRequest {
        WorkerRequest::Exact(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn from_raw_accepts_auto_and_positive_values() {
        assert_eq!(WorkerRequest::from_raw(-1), Ok(WorkerRequest::Auto));
        assert_eq!(WorkerRequest::from_raw(4), Ok(exact(4)));
    }

    #[test]
    fn from_raw_rejects_zero_and_other_negatives() {
        assert_eq!(
            WorkerRequest::from_raw(0),
            Err(ConfigError::InvalidThreadCount(0))
        );
        assert_eq!(
            WorkerRequest::from_raw(-2),
            Err(ConfigError::InvalidThreadCount(-2))
        );
    }

    #[test]
    fn auto_uses_every_available_core() {
        assert_eq!(resolve_worker_count(WorkerRequest::Auto, 8), 8);
    }

    #[test]
    fn explicit_request_within_budget_is_kept() {
        assert_eq!(resolve_worker_count(exact(3), 8), 3);
        assert_eq!(resolve_worker_count(exact(8), 8), 8);
    }

    #[test]
    fn explicit_request_above_budget_is_clamped() {
        assert_eq!(resolve_worker_count(exact(64), 4), 4);
    }

    #[test]
    fn zero_available_cores_is_treated_as_one() {
        assert_eq!(resolve_worker_count(WorkerRequest::Auto, 0), 1);
    }

    #[test]
    fn available_cores_is_positive() {
        assert!(available_cores() >= 1);
    }

    #[test]
    fn numeric_threads_are_bounded_by_core_budget() {
        let two = NonZeroUsize::new(2).unwrap();
        let eight = NonZeroUsize::new(8).unwrap();

        assert_eq!(resolve_numeric_threads(two, 2, 8), 2);
        assert_eq!(resolve_numeric_threads(eight, 2, 8), 4);
        assert_eq!(resolve_numeric_threads(eight, 8, 8), 1);
        assert_eq!(resolve_numeric_threads(NonZeroUsize::MIN, 16, 4), 1);
    }

    #[test]
    fn partition_covers_every_target_exactly_once() {
        for n in 0..25 {
            for workers in 1..10 {
                let ranges = partition_targets(n, workers);
                let indices: Vec<usize> = ranges.iter().cloned().flatten().collect();
                assert_eq!(indices, (1..=n).collect::<Vec<_>>(), "n={n}, w={workers}");
                assert!(ranges.len() <= workers);
                assert!(ranges.iter().all(|r| !r.is_empty()));
            }
        }
    }

    #[test]
    fn partition_is_balanced_with_remainder_first() {
        let ranges = partition_targets(10, 3);
        assert_eq!(ranges, vec![1..5, 5..8, 8..11]);
    }

    #[test]
    fn partition_with_more_workers_than_targets_uses_one_range_per_target() {
        let ranges = partition_targets(2, 8);
        assert_eq!(ranges, vec![1..2, 2..3]);
    }

    #[test]
    fn partition_with_no_targets_is_empty() {
        assert!(partition_targets(0, 4).is_empty());
    }
}
