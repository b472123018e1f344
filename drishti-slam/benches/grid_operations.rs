//! Benchmark distributed grid operations.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use drishti_slam::filter::PathTree;
use drishti_slam::sensor::synthesize_features;
use drishti_slam::{
    DistributedGrid, Lineage, MapConfig, Pose3D, SensorModelConfig, StereoHead,
    StereoSensorModel, WorldPoint,
};
use std::hint::black_box;

/// Committed rectangular room centred on the origin.
fn room(half_x: f32, half_y: f32) -> DistributedGrid {
    let mut grid = DistributedGrid::new(MapConfig::fine());
    let committed = Lineage::committed_only();
    let corners = [
        (-half_x, -half_y),
        (half_x, -half_y),
        (half_x, half_y),
        (-half_x, half_y),
    ];
    for i in 0..4 {
        let (ax, ay) = corners[i];
        let (bx, by) = corners[(i + 1) % 4];
        grid.insert_wall(
            &WorldPoint::new(ax, ay, 0.0),
            &WorldPoint::new(bx, by, 0.0),
            700.0,
            &committed,
        );
    }
    grid
}

fn bench_insert_frame(c: &mut Criterion) {
    let truth = room(600.0, 1000.0);
    let head = StereoHead::default();
    let camera = head.camera_pose(&Pose3D::identity());
    let features = synthesize_features(
        &truth,
        &Lineage::committed_only(),
        &camera,
        &head.calibration,
        8,
    );
    let model = StereoSensorModel::new(SensorModelConfig::default());
    let rays = model.create_observation(&camera, &head.calibration, &features, &[], true);

    // Writes authored by a hypothesis, not the committed layer
    let mut tree = PathTree::new();
    let root = tree.add_root(Pose3D::identity());
    let lineage = tree
        .spawn(root, Pose3D::identity())
        .map(|leaf| tree.lineage(leaf))
        .unwrap_or_default();

    c.bench_function("insert_frame", |b| {
        b.iter(|| {
            let mut grid = DistributedGrid::new(MapConfig::fine());
            let mut updated = 0;
            for ray in &rays {
                updated += grid.insert_ray(black_box(ray), &lineage);
            }
            black_box(updated)
        })
    });
}

fn bench_probe_range(c: &mut Criterion) {
    let grid = room(600.0, 1000.0);
    let lineage = Lineage::committed_only();
    let origin = WorldPoint::new(0.0, 0.0, 300.0);
    let direction = WorldPoint::new(0.3, 1.0, -0.1);

    c.bench_function("probe_range", |b| {
        b.iter(|| {
            black_box(grid.probe_range(
                black_box(&origin),
                black_box(&direction),
                &lineage,
                true,
            ))
        })
    });
}

fn bench_probe_view_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("probe_view_step");
    let grid = room(600.0, 1000.0);
    let lineage = Lineage::committed_only();
    let camera = Pose3D::new(0.0, 0.0, 400.0, 0.0, -0.1, 0.0);

    for step in [32usize, 16, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(step), step, |b, &step| {
            b.iter(|| black_box(grid.probe_view(&camera, 65.0, 320, 240, step, 4000.0, &lineage)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_frame,
    bench_probe_range,
    bench_probe_view_steps
);
criterion_main!(benches);
