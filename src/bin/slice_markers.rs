use serde::Serialize;
use std::env;
use std::path::Path;
use tera_qc::config::slice_markers::load_config;
use tera_qc::diagnostics::TimingBreakdown;
use tera_qc::image::io::{save_image_u8, write_json_file};
use tera_qc::line::CandidateLine;
use tera_qc::markers::{EdgeLineDetector, LineFilter, MarkerParams};
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
    let params = MarkerParams::from_config(&config.params)?;

    let pipeline = QcPipeline::new(params.clone())?.with_element_type(config.element_type);
    let (volume, kind) = pipeline.load(&config.input)?;
    let shape = volume.shape();
    if config.slice >= shape.depth {
        return Err(QcError::InvalidParameter {
            name: "slice",
            reason: format!("{} is outside 0..{}", config.slice, shape.depth),
        });
    }

    let slice = volume.slice_f32(config.slice, 0)?;
    let detection = EdgeLineDetector::new(params.clone())?
        .detect(&slice, config.slice)
        .map_err(|e| e.at_slice(config.slice))?;
    let filter = LineFilter::from_params(shape.spatial(), &params);
    let accepted: Vec<CandidateLine> = detection
        .lines
        .iter()
        .copied()
        .filter(|line| filter.accepts(line, config.slice))
        .collect();

    let summary = SliceMarkersSummary {
        input_kind: kind.label(),
        width: shape.width,
        height: shape.height,
        depth: shape.depth,
        slice: config.slice,
        max_magnitude: detection.max_magnitude,
        edge_pixels: detection.edges.count_nonzero(),
        candidates: detection.lines,
        accepted,
        timings: detection.timings,
    };

    save_image_u8(&detection.edges, &config.output.edges_png)?;
    write_json_file(&config.output.lines_json, &summary)?;

    println!(
        "Saved edge map of slice {} to {}",
        config.slice,
        config.output.edges_png.display()
    );
    println!(
        "Saved {} candidate and {} accepted lines to {}",
        summary.candidates.len(),
        summary.accepted.len(),
        config.output.lines_json.display()
    );
    Ok(())
}

fn usage() -> QcError {
    QcError::InvalidParameter {
        name: "config",
        reason: "Usage: slice_markers <config.json>".to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SliceMarkersSummary {
    input_kind: &'static str,
    width: usize,
    height: usize,
    depth: usize,
    slice: usize,
    max_magnitude: f32,
    edge_pixels: usize,
    candidates: Vec<CandidateLine>,
    accepted: Vec<CandidateLine>,
    timings: TimingBreakdown,
}
