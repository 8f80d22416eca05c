use std::env;
use std::path::{Path, PathBuf};
use tera_qc::config::qc::{load_config, QcOutputConfig, QcToolConfig, RunMode};
use tera_qc::image::io::{write_json_file, SliceDirWriter, VolumeWriter};
use tera_qc::pipeline::{find_brain_dirs, QcOutcome};
use tera_qc::{QcError, QcPipeline};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), QcError> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;
    let pipeline = QcPipeline::from_config(&config.params)?
        .with_masking(config.masking)
        .with_element_type(config.element_type);

    match config.mode {
        RunMode::Single => {
            let outcome = pipeline.run(&config.input)?;
            save_outputs(&outcome, &config.output)?;
            print_summary(&config.input, &outcome);
        }
        RunMode::Batch => run_batch(&pipeline, &config)?,
    }
    Ok(())
}

/// Process every brain directory below `config.input`, one output
/// sub-directory per brain. A failing brain is reported and skipped.
fn run_batch(pipeline: &QcPipeline, config: &QcToolConfig) -> Result<(), QcError> {
    let brains = find_brain_dirs(&config.input)?;
    if brains.is_empty() {
        return Err(QcError::InvalidTileRoot {
            path: config.input.clone(),
            reason: "no brain directories found".to_string(),
        });
    }

    let mut failures = 0usize;
    for brain in &brains {
        let name = brain.file_name().map(PathBuf::from).unwrap_or_default();
        let output = QcOutputConfig {
            mask_dir: config.output.mask_dir.as_ref().map(|d| d.join(&name)),
            volume_dir: config.output.volume_dir.as_ref().map(|d| d.join(&name)),
            report_json: config
                .output
                .report_json
                .as_ref()
                .map(|p| per_brain_report(p, &name)),
        };
        match pipeline
            .run(brain)
            .and_then(|outcome| save_outputs(&outcome, &output).map(|_| outcome))
        {
            Ok(outcome) => print_summary(brain, &outcome),
            Err(err) => {
                failures += 1;
                eprintln!("Failed {}: {err}", brain.display());
            }
        }
    }
    println!("Processed {} brains, {} failed", brains.len(), failures);
    Ok(())
}

fn per_brain_report(path: &Path, brain: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("report.json"));
    parent.join(brain).join(file)
}

fn save_outputs(outcome: &QcOutcome, output: &QcOutputConfig) -> Result<(), QcError> {
    let writer = SliceDirWriter::default();
    if let Some(dir) = &output.mask_dir {
        writer.save(dir, &outcome.mask)?;
    }
    if let (Some(dir), Some(masked)) = (&output.volume_dir, &outcome.masked) {
        writer.save(dir, masked)?;
    }
    if let Some(path) = &output.report_json {
        write_json_file(path, &outcome.report)?;
    }
    Ok(())
}

fn print_summary(input: &Path, outcome: &QcOutcome) {
    let report = &outcome.report;
    println!(
        "{}: {}x{}x{} {}, {} marker lines on {} slices, mask coverage {:.3}%, {:.1} ms",
        input.display(),
        report.input.width,
        report.input.height,
        report.input.depth,
        report.input.element_type,
        report.markers.total_accepted(),
        report.markers.marked_slices().len(),
        report.mask_coverage() * 100.0,
        report.timings.total_ms
    );
}

fn usage() -> QcError {
    QcError::InvalidParameter {
        name: "config",
        reason: "Usage: tera_qc <config.json>".to_string(),
    }
}
