mod common;

use common::init_logging;
use common::tile_tree::{coded_u16, constant_u16, TileTree};
use tera_qc::tiles::{find_lowest_resolution, reassemble};
use tera_qc::volume::VoxelData;
use tera_qc::{ElementType, QcError, Shape, VolumeBuffer};

#[test]
fn quadrants_land_at_their_band_offsets() {
    init_logging();
    let mut tree = TileTree::new("RES(100x200x50)");
    tree.add_block("000000", "000000_000000", "000000_000000_000000.tif", constant_u16(100, 50, 50, 10));
    tree.add_block("000000", "000000_000100", "000000_000100_000000.tif", constant_u16(100, 50, 50, 20));
    tree.add_block("000050", "000050_000000", "000050_000000_000000.tif", constant_u16(100, 50, 50, 30));
    tree.add_block("000050", "000050_000100", "000050_000100_000000.tif", constant_u16(100, 50, 50, 40));

    let volume = reassemble(&tree.root, &tree.loader(), ElementType::U16).unwrap();
    assert_eq!(volume.shape(), Shape::volume(200, 100, 50));
    assert_eq!(volume.element_type(), Some(ElementType::U16));

    let shape = volume.shape();
    let data = volume.as_u16().unwrap();
    for z in [0, 17, 49] {
        for y in 0..100 {
            for x in 0..200 {
                let expected = match (y < 50, x < 100) {
                    (true, true) => 10,
                    (true, false) => 20,
                    (false, true) => 30,
                    (false, false) => 40,
                };
                assert_eq!(data[shape.index(x, y, z, 0)], expected, "({x}, {y}, {z})");
            }
        }
    }
}

#[test]
fn every_voxel_comes_from_its_block() {
    init_logging();
    // Two blocks along Z per X band, X bands of unequal width.
    let mut tree = TileTree::new("RES(4x5x6)");
    let blocks = [
        ("y0", "x0", "z0", 3, 1000),
        ("y0", "x0", "z3", 3, 2000),
        ("y0", "x1", "z0", 2, 3000),
        ("y0", "x1", "z3", 2, 4000),
    ];
    for (yb, xb, file, width, base) in blocks {
        tree.add_block(yb, xb, file, coded_u16(width, 4, 3, base));
    }

    let volume = reassemble(&tree.root, &tree.loader(), ElementType::U16).unwrap();
    let shape = volume.shape();
    assert_eq!(shape, Shape::volume(5, 4, 6));
    for z in 0..6 {
        for y in 0..4 {
            for x in 0..5 {
                let (base, bx) = match (x < 3, z < 3) {
                    (true, true) => (1000, x),
                    (true, false) => (2000, x),
                    (false, true) => (3000, x - 3),
                    (false, false) => (4000, x - 3),
                };
                let expected = base + ((z % 3) * 100 + y * 10 + bx) as u16;
                assert_eq!(volume.as_u16().unwrap()[shape.index(x, y, z, 0)], expected);
            }
        }
    }
}

#[test]
fn bands_are_walked_in_natural_order() {
    let mut tree = TileTree::new("RES(20x1x1)");
    // Lexical order would place "10" before "2".
    tree.add_block("2", "0", "0", constant_u16(1, 10, 1, 2));
    tree.add_block("10", "0", "0", constant_u16(1, 10, 1, 10));
    let volume = reassemble(&tree.root, &tree.loader(), ElementType::U16).unwrap();
    assert_eq!(volume.get_f32(0, 0, 0, 0), Some(2.0));
    assert_eq!(volume.get_f32(0, 15, 0, 0), Some(10.0));
}

#[test]
fn mixed_element_types_yield_no_volume() {
    let mut tree = TileTree::new("RES(2x2x2)");
    tree.add_block("0", "0", "0", constant_u16(2, 2, 1, 7));
    let bad = tree.add_block(
        "0",
        "0",
        "1",
        VolumeBuffer::from_u8(Shape::volume(2, 2, 1), vec![1; 4]).unwrap(),
    );
    let err = reassemble(&tree.root, &tree.loader(), ElementType::U16).unwrap_err();
    match err {
        QcError::InconsistentElementType {
            path,
            expected,
            found,
        } => {
            assert_eq!(path, bad);
            assert_eq!(expected, ElementType::U16);
            assert_eq!(found, ElementType::U8);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn invalid_roots_are_rejected() {
    let tree = TileTree::new("RES(2x2x2)");
    let loader = tree.loader();

    let plain = tree.dir.path().join("not_a_tile_root");
    std::fs::create_dir_all(&plain).unwrap();
    for root in [plain, tree.dir.path().join("RES(2x2x2)_missing")] {
        assert!(matches!(
            reassemble(&root, &loader, ElementType::U16),
            Err(QcError::InvalidTileRoot { .. })
        ));
    }
}

#[test]
fn oversized_block_is_out_of_bounds() {
    let mut tree = TileTree::new("RES(2x2x2)");
    tree.add_block("0", "0", "0", constant_u16(3, 2, 1, 1));
    assert!(matches!(
        reassemble(&tree.root, &tree.loader(), ElementType::U16),
        Err(QcError::BlockOutOfBounds { .. })
    ));
}

#[test]
fn loader_failure_names_the_block() {
    let mut tree = TileTree::new("RES(2x2x1)");
    tree.add_block("0", "0", "0", constant_u16(2, 2, 1, 1));
    let stray = tree.root.join("0").join("0").join("1");
    std::fs::write(&stray, b"").unwrap();
    match reassemble(&tree.root, &tree.loader(), ElementType::U16) {
        Err(QcError::BlockLoadFailed { path, source }) => {
            assert_eq!(path, stray);
            assert!(matches!(*source, QcError::Load { .. }));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn lowest_resolution_is_chosen() {
    let tree = TileTree::new("RES(100x200x50)");
    for name in ["RES(25x50x12)", "RES(50x100x25)", "notes"] {
        std::fs::create_dir_all(tree.brain.join(name)).unwrap();
    }
    let lowest = find_lowest_resolution(&tree.brain).unwrap();
    assert_eq!(lowest, tree.brain.join("RES(25x50x12)"));

    let mut small = TileTree::new("RES(1x1x1)");
    small.add_block("0", "0", "0", constant_u16(1, 1, 1, 9));
    let volume = reassemble(&small.root, &small.loader(), ElementType::U16).unwrap();
    assert!(matches!(volume.data(), Some(VoxelData::U16(v)) if v == &vec![9]));
}
