use crate::core::alignment::kabsch::{selected_positions, selection_rmsd, superpose_structures};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::utils::geometry::max_deviation;
use crate::engine::context::AlignmentContext;
use crate::engine::error::TaskError;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, enabled, info, instrument};

/// Result of aligning one target onto the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub source: PathBuf,
    pub output: PathBuf,
    /// RMSD over the RMSD selection before the target was moved.
    pub rmsd_before: f64,
    /// RMSD over the RMSD selection after the target was moved.
    pub rmsd_after: f64,
    /// RMSD over the fit selection reported by the superposition itself.
    pub fit_rmsd: f64,
    pub fitted_atoms: usize,
}

/// Aligns one target onto the reference and writes it to `output`.
///
/// The target is loaded, measured, superposed on the fit selection, written,
/// and measured again. The source file is never modified.
#[instrument(skip_all, name = "align_target_task", fields(index = index, source = %source.display()))]
pub fn run(
    index: usize,
    source: &Path,
    output: &Path,
    context: &AlignmentContext,
) -> Result<AlignmentRecord, TaskError> {
    let alignment = context.alignment();

    let (mut mobile, metadata) = PdbFile::read_from_path(source).map_err(|e| TaskError::Load {
        path: source.to_path_buf(),
        source: e,
    })?;
    debug!(atoms = mobile.atom_count(), "Loaded target structure.");

    let rmsd_before = selection_rmsd(&mobile, context.reference, &alignment.rmsd_selection)?;
    context.reporter.message(format!(
        "Decoy {}, RMSD to ref before alignment: {}",
        source.display(),
        rmsd_before
    ));

    let superposition = superpose_structures(
        &mut mobile,
        context.reference,
        &alignment.fit_selection,
        context.numeric_threads,
    )?;
    debug!(
        fitted = superposition.fitted_points,
        fit_rmsd = superposition.rmsd,
        "Superposed target onto reference."
    );

    PdbFile::write_to_path(&mobile, &metadata, output).map_err(|e| TaskError::Write {
        path: output.to_path_buf(),
        source: e,
    })?;

    let rmsd_after = selection_rmsd(&mobile, context.reference, &alignment.rmsd_selection)?;
    context.reporter.message(format!(
        "Decoy {}, RMSD to ref after alignment: {}",
        source.display(),
        rmsd_after
    ));

    if enabled!(Level::DEBUG) {
        let aligned = selected_positions(&mobile, &alignment.rmsd_selection);
        let reference = selected_positions(context.reference, &alignment.rmsd_selection);
        if let Some((atom, distance)) = max_deviation(&aligned, &reference) {
            debug!(atom, distance, "Largest remaining deviation.");
        }
    }

    info!(
        rmsd_before,
        rmsd_after,
        output = %output.display(),
        "Aligned target {}.",
        index
    );

    Ok(AlignmentRecord {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        rmsd_before,
        rmsd_after,
        fit_rmsd: superposition.rmsd,
        fitted_atoms: superposition.fitted_points,
    })
}
