use crate::error::{CliError, Result};
use multialign::engine::error::TaskError;
use multialign::workflows::batch_align::{BatchReport, TaskOutcome};
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ReportRow {
    index: usize,
    source: String,
    output: String,
    status: &'static str,
    rmsd_before: Option<f64>,
    rmsd_after: Option<f64>,
    fit_rmsd: Option<f64>,
    fitted_atoms: Option<usize>,
    error: Option<String>,
}

impl From<&TaskOutcome> for ReportRow {
    fn from(outcome: &TaskOutcome) -> Self {
        let mut row = Self {
            index: outcome.index,
            source: outcome.source.display().to_string(),
            output: outcome.output.display().to_string(),
            status: "ok",
            rmsd_before: None,
            rmsd_after: None,
            fit_rmsd: None,
            fitted_atoms: None,
            error: None,
        };
        match &outcome.result {
            Ok(record) => {
                row.rmsd_before = Some(record.rmsd_before);
                row.rmsd_after = Some(record.rmsd_after);
                row.fit_rmsd = Some(record.fit_rmsd);
                row.fitted_atoms = Some(record.fitted_atoms);
            }
            Err(TaskError::Cancelled) => {
                row.status = "cancelled";
            }
            Err(e) => {
                row.status = "failed";
                row.error = Some(e.to_string());
            }
        }
        row
    }
}

/// Writes one CSV row per target, in index order.
pub fn write_report<W: io::Write>(report: &BatchReport, writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for outcome in &report.outcomes {
        csv_writer.serialize(ReportRow::from(outcome))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_report_to_path(report: &BatchReport, path: &Path) -> Result<()> {
    debug!("Writing CSV report to {:?}", path);
    let to_cli_error = |source: csv::Error| CliError::Report {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| to_cli_error(e.into()))?;
    write_report(report, file).map_err(to_cli_error)
}
