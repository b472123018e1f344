//! Simulated room survey.
//!
//! Drives a robot around a synthetic square room, feeds rendered stereo
//! features to the particle filter and writes top-down renderings of the
//! ground truth and of the best hypothesis's map.
//!
//! Usage:
//!   cargo run --release --bin drishti_sim -- --steps 40 --particles 30
//!   cargo run --release --features parallel --bin drishti_sim

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info, warn};

use drishti_slam::filter::{MotionModel, MotionModelConfig, RangeResidualScorer, RangeScorerConfig};
use drishti_slam::io::export_ppm;
use drishti_slam::sensor::SyntheticStereo;
use drishti_slam::{
    DistributedGrid, DrishtiConfig, Lineage, MotionInput, NoiseGenerator, Odometry,
    ParticleFilter, Pose3D, RayModelLookup, StereoFrame, StereoSensorModel, WorldPoint,
};

/// Simulated DrishtiSLAM room survey
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "configs/drishti.yaml")]
    config: String,

    /// Edge length of the square room (mm)
    #[arg(long, default_value_t = 3000.0)]
    room_mm: f32,

    /// Wall height (mm)
    #[arg(long, default_value_t = 800.0)]
    wall_height_mm: f32,

    /// Number of update cycles
    #[arg(short, long, default_value_t = 30)]
    steps: usize,

    /// Forward speed (mm/s)
    #[arg(long, default_value_t = 150.0)]
    speed: f32,

    /// Cycle duration (s)
    #[arg(long, default_value_t = 0.5)]
    dt: f32,

    /// Override the configured particle count
    #[arg(short, long)]
    particles: Option<usize>,

    /// Random seed (0 = OS entropy)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Disparity noise of the simulated cameras (pixels)
    #[arg(long, default_value_t = 0.3)]
    disparity_noise: f32,

    /// Pixel step of the simulated feature grid
    #[arg(long, default_value_t = 16)]
    pixel_step: usize,

    /// Override the configured output directory
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> drishti_slam::Result<()> {
    let mut config = DrishtiConfig::load_or_default(Path::new(&args.config));
    if let Some(particles) = args.particles {
        config.filter.num_particles = particles;
    }
    config.filter.seed = args.seed;
    if let Some(output) = &args.output {
        config.persistence.output_dir = output.clone();
    }

    let map_config = config.to_map_config();
    let filter_config = config.to_filter_config();

    // Ground truth world: committed walls only
    let mut world = DistributedGrid::new(map_config.clone());
    let cells = build_room(&mut world, args.room_mm, args.wall_height_mm);
    info!(
        "Room {:.0}mm x {:.0}mm: {} wall cells",
        args.room_mm, args.room_mm, cells
    );

    // Ray model for the first head
    let sensor_config = config.sensor_model_config();
    let sensor_model = match filter_config.heads.first() {
        Some(head) => {
            let path = config.persistence.ray_model_path(0);
            let lookup = RayModelLookup::load_or_build(&path, &head.calibration, &sensor_config);
            save_artifact(&lookup, &path);
            StereoSensorModel::with_lookup(sensor_config, lookup)
        }
        None => StereoSensorModel::new(sensor_config),
    };

    let heads = filter_config.heads.clone();
    let start = Pose3D::identity();
    let mut filter = ParticleFilter::with_sensor_model(filter_config, sensor_model, start);
    let mut grid = DistributedGrid::new(map_config.clone());
    let scorer = RangeResidualScorer::new(
        RangeScorerConfig::default(),
        map_config.localisation_radius_mm,
    );
    let mut camera = SyntheticStereo::new(args.seed, args.disparity_noise, args.pixel_step);

    let truth_motion = MotionModel::new(MotionModelConfig::noiseless());
    let mut truth_noise = NoiseGenerator::new(1);
    let mut truth = start;
    let committed = Lineage::committed_only();

    for step in 0..args.steps {
        let odometry = steer(&truth, args.room_mm, args.speed, args.dt);
        truth = truth_motion.sample(&truth, &odometry, &mut truth_noise);

        let frames: Vec<StereoFrame> = heads
            .iter()
            .enumerate()
            .map(|(i, head)| {
                let (features, colours) = camera.capture(&world, &committed, &truth, head);
                StereoFrame::new(i, features, colours)
            })
            .collect();

        filter.predict(&MotionInput::Odometry(odometry))?;
        let updates = filter.fuse(&mut grid, &frames)?;
        filter.score(&grid, &scorer)?;
        let best = filter.resample(&mut grid)?;

        let state = filter.state();
        info!(
            "step {:3}: error={:6.1}mm neff={:6.1} tree={:4} committed={:3} updates={}",
            step,
            best.pose.distance(&truth),
            state.neff,
            state.tree_size,
            state.committed_poses,
            updates
        );
    }

    let stats = grid.stats();
    info!(
        "Map: {} live nodes, {} committed cells, {} authors",
        stats.live_nodes, stats.committed_cells, stats.authors
    );

    let output_dir = PathBuf::from(&config.persistence.output_dir);
    std::fs::create_dir_all(&output_dir)?;
    let size = config.persistence.render_size;

    let truth_path = output_dir.join("drishti_truth.ppm");
    export_ppm(&world.render(&committed, size, size), size, size, &truth_path)?;
    info!("Saved: {}", truth_path.display());

    let index = filter.best().map(|b| b.index).unwrap_or(0);
    let lineage = filter.lineage(index)?;
    let map_path = output_dir.join("drishti_map.ppm");
    export_ppm(&grid.render(&lineage, size, size), size, size, &map_path)?;
    info!("Saved: {}", map_path.display());

    let trajectory = filter.best_trajectory();
    if let Some(last) = trajectory.last() {
        info!(
            "Best trajectory: {} poses, final ({:.0}, {:.0}) vs truth ({:.0}, {:.0})",
            trajectory.len(),
            last.x,
            last.y,
            truth.x,
            truth.y
        );
    }
    Ok(())
}

/// Four committed walls around the origin.
fn build_room(world: &mut DistributedGrid, room_mm: f32, height_mm: f32) -> usize {
    let h = room_mm / 2.0;
    let corners = [
        WorldPoint::new(-h, -h, 0.0),
        WorldPoint::new(h, -h, 0.0),
        WorldPoint::new(h, h, 0.0),
        WorldPoint::new(-h, h, 0.0),
    ];
    let committed = Lineage::committed_only();
    (0..4)
        .map(|i| world.insert_wall(&corners[i], &corners[(i + 1) % 4], height_mm, &committed))
        .sum()
}

/// Drive forward, turning in place when a wall gets close.
fn steer(pose: &Pose3D, room_mm: f32, speed: f32, dt: f32) -> Odometry {
    let margin = room_mm / 2.0 - 600.0;
    let ahead = pose.position() + pose.forward() * (speed * dt);
    if ahead.x.abs() > margin || ahead.y.abs() > margin {
        Odometry::planar(0.0, 0.8, dt)
    } else {
        Odometry::forward(speed, dt)
    }
}

fn save_artifact(lookup: &RayModelLookup, path: &Path) {
    if path.exists() {
        return;
    }
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!("Cannot create {}: {}", parent.display(), e);
        return;
    }
    match lookup.save(path) {
        Ok(()) => info!("Saved ray model: {}", path.display()),
        Err(e) => warn!("Cannot save ray model {}: {}", path.display(), e),
    }
}
