use crate::cli::AlignArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::report;
use crate::ui::{CliProgressHandler, UiEvent, UiSender};
use multialign::engine::error::EngineError;
use multialign::engine::progress::ProgressReporter;
use multialign::engine::work_list::WorkList;
use multialign::workflows::{self, batch_align::BatchReport};
use std::path::Path;
use tracing::info;

pub async fn run(args: AlignArgs, ui_sender: UiSender) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;

    info!("Reading structure list from {:?}", &args.pdblist);
    let work_list = WorkList::from_list_file(&args.pdblist).map_err(EngineError::from)?;
    info!(
        "Loaded {} path(s): 1 reference and {} target(s).",
        work_list.len(),
        work_list.target_count()
    );

    let progress_handler = CliProgressHandler::new(ui_sender.clone());
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the batch alignment workflow...");
    let batch_report = tokio::task::block_in_place(|| {
        workflows::batch_align::run(&work_list, &settings.batch, &reporter)
    })?;

    if let Some(path) = &settings.report {
        report::write_report_to_path(&batch_report, path)?;
        info!("Wrote CSV report to {:?}", path);
    }

    print_summary(&batch_report, &settings.batch.output_dir, &ui_sender);

    let failed = batch_report.failure_count();
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::TargetsFailed {
            failed,
            total: batch_report.outcomes.len(),
        })
    }
}

fn print_summary(report: &BatchReport, output_dir: &Path, ui_sender: &UiSender) {
    let emit = |line: String| {
        if let Err(e) = ui_sender.send(UiEvent::Output(line)) {
            if let UiEvent::Output(line) = e.0 {
                println!("{}", line);
            }
        }
    };

    let total = report.outcomes.len();
    let succeeded = report.succeeded().count();
    emit(format!(
        "Aligned {}/{} target(s) onto {} using {} worker(s). Output in {}",
        succeeded,
        total,
        report.reference.display(),
        report.workers,
        output_dir.display()
    ));

    for (outcome, error) in report.failed() {
        emit(format!("  ✗ {}: {}", outcome.source.display(), error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::fs;
    use tokio::sync::mpsc;

    const CA_TRACE: [(f64, f64, f64); 5] = [
        (0.0, 0.0, 0.0),
        (3.8, 0.0, 0.0),
        (5.1, 3.6, 0.0),
        (8.7, 4.2, 1.3),
        (9.9, 7.5, 3.1),
    ];

    fn pdb_text(shift: (f64, f64, f64)) -> String {
        let mut text = String::from("HEADER    TEST STRUCTURE\n");
        for (i, (x, y, z)) in CA_TRACE.iter().enumerate() {
            text.push_str(&format!(
                "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           C\n",
                i + 1,
                i + 1,
                x + shift.0,
                y + shift.1,
                z + shift.2
            ));
        }
        text.push_str("END\n");
        text
    }

    fn args_for(dir: &Path, list: &str, extra: &[&str]) -> AlignArgs {
        let list_path = dir.join("list.txt");
        fs::write(&list_path, list).unwrap();
        let mut args = vec![
            "multialign".to_string(),
            "--pdblist".to_string(),
            list_path.display().to_string(),
            "--outdir".to_string(),
            dir.join("out").display().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::parse_from(args).align
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn aligns_listed_structures_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = dir.path().join("ref.pdb");
        let a_path = dir.path().join("a.pdb");
        let b_path = dir.path().join("b.pdb");
        fs::write(&ref_path, pdb_text((0.0, 0.0, 0.0))).unwrap();
        fs::write(&a_path, pdb_text((10.0, -2.0, 4.0))).unwrap();
        fs::write(&b_path, pdb_text((-3.0, 6.0, 1.5))).unwrap();

        let list = format!(
            "{}\n{}\n{}\n",
            ref_path.display(),
            a_path.display(),
            b_path.display()
        );
        let report_path = dir.path().join("report.csv");
        let args = args_for(
            dir.path(),
            &list,
            &["-j", "2", "--report", report_path.to_str().unwrap()],
        );

        let (sender, mut receiver) = mpsc::unbounded_channel();
        run(args, sender).await.unwrap();

        let out = dir.path().join("out");
        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.pdb", "b.pdb", "ref.pdb"]);
        assert_eq!(
            fs::read(out.join("ref.pdb")).unwrap(),
            fs::read(&ref_path).unwrap()
        );
        assert_eq!(
            fs::read_to_string(&report_path).unwrap().lines().count(),
            3
        );

        let mut messages = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let UiEvent::Progress(multialign::engine::progress::Progress::Message(msg)) = event {
                messages.push(msg);
            }
        }
        for path in [&a_path, &b_path] {
            for phase in ["before", "after"] {
                let prefix = format!("Decoy {}, RMSD to ref {} alignment: ", path.display(), phase);
                assert!(messages.iter().any(|m| m.starts_with(&prefix)), "missing {prefix}");
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_target_yields_targets_failed_error() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = dir.path().join("ref.pdb");
        fs::write(&ref_path, pdb_text((0.0, 0.0, 0.0))).unwrap();
        let missing = dir.path().join("missing.pdb");

        let list = format!("{}\n{}\n", ref_path.display(), missing.display());
        let args = args_for(dir.path(), &list, &[]);
        let (sender, _receiver) = mpsc::unbounded_channel();

        let result = run(args, sender).await;

        assert!(matches!(
            result,
            Err(CliError::TargetsFailed { failed: 1, total: 1 })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_for(dir.path(), "\n\n", &[]);
        let (sender, _receiver) = mpsc::unbounded_channel();

        let result = run(args, sender).await;

        assert!(matches!(result, Err(CliError::Engine(EngineError::WorkList(_)))));
        assert!(!dir.path().join("out").exists());
    }
}
