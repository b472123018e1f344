//! Benchmark full particle filter cycles.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use drishti_slam::filter::{MotionModelConfig, RangeResidualScorer};
use drishti_slam::sensor::synthesize_features;
use drishti_slam::{
    DistributedGrid, Lineage, MapConfig, MotionInput, Odometry, ParticleFilter,
    ParticleFilterConfig, Pose3D, StereoFrame, StereoHead, WorldPoint,
};
use std::hint::black_box;

fn room() -> DistributedGrid {
    let mut grid = DistributedGrid::new(MapConfig::fine());
    let committed = Lineage::committed_only();
    let corners = [(-600.0, -1000.0), (600.0, -1000.0), (600.0, 1000.0), (-600.0, 1000.0)];
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

fn bench_filter_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_cycle");
    group.sample_size(10);

    let truth = room();
    let head = StereoHead::default();
    let features = synthesize_features(
        &truth,
        &Lineage::committed_only(),
        &head.camera_pose(&Pose3D::identity()),
        &head.calibration,
        16,
    );
    let frames = vec![StereoFrame::new(0, features, Vec::new())];
    let scorer = RangeResidualScorer::new(Default::default(), 3000.0);
    let input = MotionInput::Odometry(Odometry::forward(0.0, 0.5));

    for num_particles in [10usize, 50, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_particles),
            num_particles,
            |b, &num_particles| {
                b.iter(|| {
                    let mut grid = room();
                    let mut filter = ParticleFilter::new(
                        ParticleFilterConfig {
                            num_particles,
                            seed: 42,
                            motion: MotionModelConfig::low_noise(),
                            ..Default::default()
                        },
                        Pose3D::identity(),
                    );
                    for _ in 0..3 {
                        let _ = filter.predict(&input);
                        let _ = filter.fuse(&mut grid, &frames);
                        let _ = filter.score(&grid, &scorer);
                        let _ = black_box(filter.resample(&mut grid));
                    }
                    black_box(filter.best_pose())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_filter_cycle);
criterion_main!(benches);
