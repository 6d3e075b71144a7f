use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::structure::Structure;
use crate::engine::config::BatchConfig;
use crate::engine::context::AlignmentContext;
use crate::engine::error::{EngineError, TaskError};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::{self, align_target::AlignmentRecord};
use crate::engine::work_list::{WorkList, WorkListError};
use crate::engine::workers::{
    available_cores, partition_targets, resolve_numeric_threads, resolve_worker_count,
};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What happened to one target.
#[derive(Debug)]
pub struct TaskOutcome {
    /// Position in the work list; targets start at 1.
    pub index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub result: Result<AlignmentRecord, TaskError>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub reference: PathBuf,
    pub reference_output: PathBuf,
    pub workers: usize,
    pub numeric_threads: usize,
    /// One entry per target, ordered by index.
    pub outcomes: Vec<TaskOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &AlignmentRecord> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&TaskOutcome, &TaskError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Aligns every target in `work_list` onto its reference.
///
/// The reference is copied unchanged into the output directory first. Targets
/// are then split into one contiguous partition per worker and aligned in
/// parallel. A failing target is recorded in the report and does not stop the
/// others unless the failure policy is fail-fast.
///
/// # Errors
///
/// Returns [`EngineError`] only for problems that prevent the run from
/// starting: an unusable output directory, an unreadable reference, or a
/// worker pool that cannot be built.
#[instrument(skip_all, name = "batch_align_workflow")]
pub fn run(
    work_list: &WorkList,
    config: &BatchConfig,
    reporter: &ProgressReporter,
) -> Result<BatchReport, EngineError> {
    // === Phase 1: Reference ===
    reporter.report(Progress::PhaseStart { name: "Reference" });
    let reference_path = work_list.reference();
    info!("Using {} as reference.", reference_path.display());
    reporter.message(format!("Using {} as reference", reference_path.display()));

    let (reference, reference_output) = prepare_reference(work_list, &config.output_dir)?;
    debug!(
        atoms = reference.atom_count(),
        output = %reference_output.display(),
        "Reference copied to output directory."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Worker plan ===
    let available = available_cores();
    let workers = resolve_worker_count(config.parallelism.workers, available);
    let numeric_threads = resolve_numeric_threads(
        config.parallelism.numeric_threads,
        workers,
        available,
    );
    let partitions = partition_targets(work_list.target_count(), workers);
    info!(
        available,
        numeric_threads,
        partitions = partitions.len(),
        "Running with {} threads.",
        workers
    );
    reporter.message(format!("Running with {} threads.", workers));

    // === Phase 3: Align targets ===
    reporter.report(Progress::PhaseStart { name: "Aligning" });
    reporter.report(Progress::TaskStart {
        total_steps: work_list.target_count() as u64,
    });

    let context = AlignmentContext::new(&reference, work_list, config, reporter, numeric_threads);
    let mut outcomes = execute(&partitions, workers * numeric_threads, &context)?;
    outcomes.sort_by_key(|o| o.index);

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let report = BatchReport {
        reference: reference_path.to_path_buf(),
        reference_output,
        workers,
        numeric_threads,
        outcomes,
    };

    let failures = report.failure_count();
    if failures == 0 {
        info!("Aligned all {} target(s).", report.outcomes.len());
    } else {
        warn!(
            "{} of {} target(s) failed.",
            failures,
            report.outcomes.len()
        );
    }

    Ok(report)
}

fn prepare_reference(
    work_list: &WorkList,
    output_dir: &Path,
) -> Result<(Structure, PathBuf), EngineError> {
    fs::create_dir_all(output_dir).map_err(|source| EngineError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = work_list.reference();
    let (structure, _) = PdbFile::read_from_path(path).map_err(|source| EngineError::Reference {
        path: path.to_path_buf(),
        source,
    })?;

    let output = work_list
        .output_path(0, output_dir)
        .ok_or_else(|| WorkListError::NoFileName {
            index: 0,
            path: path.to_path_buf(),
        })?;
    if is_same_file(path, &output) {
        debug!("Reference already lives in the output directory; leaving it in place.");
    } else {
        fs::copy(path, &output).map_err(|source| EngineError::ReferenceWrite {
            path: output.clone(),
            source,
        })?;
    }

    Ok((structure, output))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Runs every partition, one per worker, on a dedicated pool of `pool_size` threads.
///
/// Threads beyond the partition count pick up the chunked coordinate updates
/// inside each task.
fn execute(
    partitions: &[Range<usize>],
    pool_size: usize,
    context: &AlignmentContext,
) -> Result<Vec<TaskOutcome>, EngineError> {
    if partitions.is_empty() {
        return Ok(Vec::new());
    }

    #[cfg(feature = "parallel")]
    let outcomes: Vec<TaskOutcome> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size.max(1))
            .thread_name(|i| format!("multialign-worker-{}", i))
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))?;

        pool.install(|| {
            partitions
                .par_iter()
                .flat_map_iter(|range| process_partition(range.clone(), context))
                .collect()
        })
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<TaskOutcome> = {
        let _ = pool_size;
        partitions
            .iter()
            .flat_map(|range| process_partition(range.clone(), context))
            .collect()
    };

    Ok(outcomes)
}

fn process_partition(range: Range<usize>, context: &AlignmentContext) -> Vec<TaskOutcome> {
    debug!(
        first = range.start,
        last = range.end.saturating_sub(1),
        "Worker started partition."
    );
    let output_dir = &context.config.output_dir;
    range
        .filter_map(|index| {
            let source = context.work_list.get(index)?;
            let output = context.work_list.output_path(index, output_dir)?;
            let outcome = process_target(index, source, output, context);
            context.reporter.report(Progress::TaskIncrement);
            Some(outcome)
        })
        .collect()
}

fn process_target(
    index: usize,
    source: &Path,
    output: PathBuf,
    context: &AlignmentContext,
) -> TaskOutcome {
    let result = if context.is_cancelled() {
        debug!(index, "Skipping target after an earlier failure.");
        Err(TaskError::Cancelled)
    } else {
        let result = tasks::align_target::run(index, source, &output, context);
        if let Err(e) = &result {
            error!(index, source = %source.display(), "Target failed: {}", e);
            context.note_failure();
        }
        result
    };

    TaskOutcome {
        index,
        source: source.to_path_buf(),
        output,
        result,
    }
}
