//! Range probing integration tests.
//!
//! Probes synthetic maps built from committed walls.

mod common;

use approx::assert_relative_eq;
use drishti_slam::{Lineage, Pose3D, WorldPoint};

#[test]
fn test_room_probe_toward_wall() {
    let grid = common::standard_room();
    let lineage = Lineage::committed_only();
    let origin = WorldPoint::new(0.0, 0.0, 200.0);

    let range = grid
        .probe_range(&origin, &WorldPoint::new(1.0, 0.0, 0.0), &lineage, false)
        .expect("wall at 600mm should be detected");
    assert!(
        (550.0..=650.0).contains(&range),
        "Expected ~600mm, got {}",
        range
    );

    let range = grid
        .probe_range(&origin, &WorldPoint::new(0.0, -1.0, 0.0), &lineage, false)
        .expect("wall at 1000mm should be detected");
    assert!((950.0..=1050.0).contains(&range), "Expected ~1000mm, got {}", range);
}

#[test]
fn test_ground_plane_probe() {
    let grid = common::fine_grid();
    let lineage = Lineage::committed_only();
    let tilt: f32 = -0.3;
    let height = 400.0;
    let camera = Pose3D::new(0.0, 0.0, height, 0.0, tilt, 0.0);

    let range = grid
        .probe_range(&camera.position(), &camera.forward(), &lineage, true)
        .expect("downward ray should meet the ground");
    assert!(range > 0.0);
    assert_relative_eq!(range, height / (-tilt).sin(), epsilon = 1.0);

    // Without ground-plane handling nothing is detected
    assert!(
        grid.probe_range(&camera.position(), &camera.forward(), &lineage, false)
            .is_none()
    );
}

#[test]
fn test_upward_ray_never_meets_ground() {
    let grid = common::fine_grid();
    let camera = Pose3D::new(0.0, 0.0, 400.0, 0.0, 0.2, 0.0);
    assert!(
        grid.probe_range(
            &camera.position(),
            &camera.forward(),
            &Lineage::committed_only(),
            true
        )
        .is_none()
    );
}

#[test]
fn test_probe_view_has_detections() {
    let grid = common::standard_room();
    let camera = Pose3D::new(0.0, 0.0, 300.0, std::f32::consts::FRAC_PI_2, 0.0, 0.0);
    let image = grid.probe_view(&camera, 65.0, 320, 240, 16, 4000.0, &Lineage::committed_only());

    assert_eq!(image.cols, 20);
    assert_eq!(image.rows, 15);
    assert_eq!(image.ranges.len(), 300);
    assert!(image.detections() > 0);

    // Centre pixel faces the wall at x = 600
    let centre = image.get(10, 7).expect("centre sample should hit");
    assert!((550.0..=700.0).contains(&centre), "centre range {}", centre);
}

#[test]
fn test_probe_view_partial_step() {
    let grid = common::fine_grid();
    let image = grid.probe_view(
        &Pose3D::identity(),
        60.0,
        100,
        50,
        16,
        1000.0,
        &Lineage::committed_only(),
    );
    assert_eq!(image.cols, 7);
    assert_eq!(image.rows, 4);
}

#[test]
fn test_single_wall_scenario() {
    let mut grid = common::fine_grid();
    common::add_wall(&mut grid, (0.0, 0.0), (0.0, 1000.0), 500.0);
    let lineage = Lineage::committed_only();
    let cell = grid.config().cell_size_mm;

    let range = grid
        .probe_range(
            &WorldPoint::new(500.0, 0.0, 100.0),
            &WorldPoint::new(-1.0, 0.0, 0.0),
            &lineage,
            false,
        )
        .expect("wall should be detected");
    assert!(
        (range - 500.0).abs() <= cell,
        "Expected 500 ± {}, got {}",
        cell,
        range
    );

    // Looking away from the wall
    assert!(
        grid.probe_range(
            &WorldPoint::new(-500.0, 0.0, 100.0),
            &WorldPoint::new(-1.0, 0.0, 0.0),
            &lineage,
            false,
        )
        .is_none()
    );
}

#[test]
fn test_render_shows_walls() {
    let grid = common::standard_room();
    let lineage = Lineage::committed_only();
    let rgb = grid.render(&lineage, 100, 100);
    assert_eq!(rgb.len(), 100 * 100 * 3);

    let non_grey = rgb
        .chunks_exact(3)
        .filter(|px| px.iter().any(|&c| c != drishti_slam::grid::UNKNOWN_GREY))
        .count();
    assert!(non_grey > 0);
}
