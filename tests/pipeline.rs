mod common;

use common::init_logging;
use common::synthetic_volume::SeamVolume;
use common::tile_tree::{constant_u16, TileTree};
use tera_qc::config::ConfigMap;
use tera_qc::image::io::{load_slice_stack, write_json_file, ImageFileLoader, SliceDirWriter, VolumeWriter};
use tera_qc::pipeline::InputKind;
use tera_qc::{ElementType, MarkerParams, MaskingMode, QcPipeline, Shape};

fn quadrant_tree() -> TileTree {
    let mut tree = TileTree::new("RES(40x60x3)");
    tree.add_block("0", "0", "0", constant_u16(30, 20, 3, 100));
    tree.add_block("0", "30", "0", constant_u16(30, 20, 3, 200));
    tree.add_block("20", "0", "0", constant_u16(30, 20, 3, 300));
    tree.add_block("20", "30", "0", constant_u16(30, 20, 3, 400));
    tree
}

#[test]
fn tile_root_and_brain_dir_run_end_to_end() {
    init_logging();
    let tree = quadrant_tree();
    let pipeline = QcPipeline::new(MarkerParams::default())
        .unwrap()
        .with_loader(tree.loader());

    for (input, kind) in [(&tree.root, "tileRoot"), (&tree.brain, "brainDir")] {
        let outcome = pipeline.run(input).unwrap();
        assert_eq!(outcome.volume.shape(), Shape::volume(60, 40, 3));
        assert_eq!(outcome.mask.shape(), Shape::volume(60, 40, 3));
        assert_eq!(outcome.report.input.kind, kind);
        assert_eq!(outcome.report.timings.stages[0].label, "load");
        assert!(outcome.report.timings.stage_ms("mask").is_some());
        assert_eq!(outcome.report.mask_voxels, 0);
        assert_eq!(outcome.masked.as_ref(), Some(&outcome.volume));
    }
}

#[test]
fn slice_directory_round_trip_through_png() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("stack");
    let volume = SeamVolume::new(200, 400, 2)
        .line((25, 360), (175, 360))
        .build();
    SliceDirWriter::default().save(&input, &volume).unwrap();
    assert_eq!(InputKind::detect(&input).unwrap(), InputKind::SliceDir);

    let params = ConfigMap::new()
        .with("filterMinDistance", 150)
        .with("se3", 3);
    let pipeline = QcPipeline::from_config(&params)
        .unwrap()
        .with_masking(MaskingMode::Isolate);
    let outcome = pipeline.run(&input).unwrap();
    assert_eq!(outcome.volume, volume);
    assert!(outcome.report.mask_voxels > 0);
    assert_eq!(outcome.report.masking.as_deref(), Some("isolate"));

    let isolated = outcome.masked.as_ref().unwrap();
    let shape = isolated.shape();
    let data = isolated.as_u16().unwrap();
    assert_eq!(data[shape.index(100, 360, 0, 0)], 30000);
    assert_eq!(data[shape.index(100, 100, 1, 0)], 0);

    let mask_dir = dir.path().join("out").join("mask");
    SliceDirWriter::default().save(&mask_dir, &outcome.mask).unwrap();
    let reloaded = load_slice_stack(&mask_dir, &ImageFileLoader, ElementType::U8).unwrap();
    assert_eq!(reloaded, outcome.mask);

    let report_path = dir.path().join("out").join("report.json");
    write_json_file(&report_path, &outcome.report).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["input"]["kind"], "sliceDir");
    assert_eq!(json["input"]["depth"], 2);
    assert_eq!(json["markers"]["slices"].as_array().unwrap().len(), 2);
}

#[test]
fn bad_parameter_is_reported_before_any_work() {
    let params = ConfigMap::new().with("cannyMin", "low");
    assert!(QcPipeline::from_config(&params).is_err());
}
