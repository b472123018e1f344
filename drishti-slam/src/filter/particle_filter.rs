//! Distributed particle filter.
//!
//! Each particle is the leaf of a trajectory hypothesis in the [`PathTree`]
//! and sees the map through that hypothesis's [`Lineage`]. One update cycle
//! runs four phases in order:
//!
//! ```text
//! Idle ──predict──▶ Predicted ──fuse──▶ Fused ──score──▶ Scored ──resample──▶ Idle
//!                        └────────────score────────────────┘
//! ```
//!
//! Resampling is systematic (low variance). Paths that lose every particle
//! are pruned along with their map writes; the trunk shared by all
//! survivors is committed into the map's shared layer.

use log::{debug, info, warn};

use crate::core::{Lineage, NoiseGenerator, PathId, Pose3D, normalize_angle};
use crate::grid::DistributedGrid;
use crate::sensor::{SensorModelConfig, StereoFrame, StereoHead, StereoSensorModel};

use super::error::{FilterError, Result};
use super::motion_model::{MotionInput, MotionModel, MotionModelConfig};
use super::path::PathTree;
use super::scoring::{Hypothesis, HypothesisScorer};

/// Position of the filter in its update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    /// Ready for a prediction step.
    #[default]
    Idle,
    /// Particles moved; evidence not yet fused.
    Predicted,
    /// Evidence fused into the map.
    Fused,
    /// Every particle scored; ready to resample.
    Scored,
}

/// A single particle.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// Leaf of this particle's trajectory hypothesis.
    pub path: PathId,
    /// Hypothesized robot pose (same as the leaf's pose).
    pub pose: Pose3D,
    /// Log-likelihood recorded this cycle.
    pub log_score: Option<f32>,
    /// Normalized weight from the last resample.
    pub weight: f64,
}

/// Configuration for the particle filter.
#[derive(Debug, Clone)]
pub struct ParticleFilterConfig {
    /// Number of particles.
    pub num_particles: usize,

    /// Random seed for deterministic behavior (0 for random).
    pub seed: u64,

    /// Neff / N ratio below which a resample counts as collapsed.
    /// Typical: 0.05-0.1
    pub collapse_threshold: f64,

    /// Consecutive collapsed resamples that trigger a reseed.
    pub collapse_cycles: usize,

    /// Fraction of the population replaced on reseed.
    pub reseed_fraction: f32,

    /// Position noise of reseeded particles (mm).
    pub reseed_spread_mm: f32,

    /// Pan noise of reseeded particles (rad).
    pub reseed_spread_rad: f32,

    /// Motion model configuration.
    pub motion: MotionModelConfig,

    /// Sensor model configuration.
    pub sensor: SensorModelConfig,

    /// Stereo heads mounted on the robot.
    pub heads: Vec<StereoHead>,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            num_particles: 100,
            seed: 0,
            collapse_threshold: 0.1,
            collapse_cycles: 3,
            reseed_fraction: 0.5,
            reseed_spread_mm: 50.0,
            reseed_spread_rad: 0.05,
            motion: MotionModelConfig::default(),
            sensor: SensorModelConfig::default(),
            heads: vec![StereoHead::default()],
        }
    }
}

impl ParticleFilterConfig {
    /// Small population for tracking with good odometry.
    pub fn tracking() -> Self {
        Self {
            num_particles: 30,
            motion: MotionModelConfig::low_noise(),
            reseed_spread_mm: 20.0,
            reseed_spread_rad: 0.02,
            ..Default::default()
        }
    }

    /// Large population for surveying with poor odometry.
    pub fn survey() -> Self {
        Self {
            num_particles: 300,
            motion: MotionModelConfig::high_noise(),
            reseed_spread_mm: 100.0,
            reseed_spread_rad: 0.1,
            ..Default::default()
        }
    }
}

/// Best hypothesis selected by a resample.
#[derive(Debug, Clone, Copy)]
pub struct BestHypothesis {
    /// Index of a particle descended from it in the new population.
    pub index: usize,
    /// Its path node.
    pub path: PathId,
    /// Its pose.
    pub pose: Pose3D,
    /// Normalized weight before resampling.
    pub weight: f64,
    /// Log-likelihood it was scored with.
    pub log_score: f32,
}

/// State of the particle filter for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// Completed update cycles.
    pub iterations: u64,
    /// Effective number of particles at the last resample.
    pub neff: f64,
    /// Best normalized weight at the last resample.
    pub max_weight: f64,
    /// Reseeds performed so far.
    pub reseeds: u64,
    /// Consecutive collapsed resamples.
    pub collapse_streak: usize,
    /// Live path nodes.
    pub tree_size: usize,
    /// Poses folded into the committed trajectory.
    pub committed_poses: usize,
    /// Map nodes freed by the last resample.
    pub pruned_nodes: usize,
    /// Map cells committed by the last resample.
    pub committed_cells: usize,
}

/// Particle filter over distributed map hypotheses.
#[derive(Debug)]
pub struct ParticleFilter {
    config: ParticleFilterConfig,
    particles: Vec<Particle>,
    tree: PathTree,
    motion_model: MotionModel,
    sensor_model: StereoSensorModel,
    noise: NoiseGenerator,
    phase: CyclePhase,
    frames: Vec<StereoFrame>,
    best: Option<BestHypothesis>,
    state: FilterState,
}

impl ParticleFilter {
    /// Create a filter with every particle at `initial_pose`.
    pub fn new(config: ParticleFilterConfig, initial_pose: Pose3D) -> Self {
        let sensor_model = StereoSensorModel::new(config.sensor.clone());
        Self::with_sensor_model(config, sensor_model, initial_pose)
    }

    /// Create a filter with a prepared sensor model (e.g. one carrying a
    /// ray model lookup).
    pub fn with_sensor_model(
        config: ParticleFilterConfig,
        sensor_model: StereoSensorModel,
        initial_pose: Pose3D,
    ) -> Self {
        let n = config.num_particles.max(1);
        let mut tree = PathTree::new();
        let root = tree.add_root(initial_pose);
        let particles = (0..n)
            .map(|_| {
                tree.retain(root);
                Particle {
                    path: root,
                    pose: initial_pose,
                    log_score: None,
                    weight: 1.0 / n as f64,
                }
            })
            .collect();

        info!(
            "[ParticleFilter] {} particles, {} stereo heads",
            n,
            config.heads.len()
        );

        Self {
            motion_model: MotionModel::new(config.motion),
            noise: NoiseGenerator::new(config.seed),
            config,
            particles,
            tree,
            sensor_model,
            phase: CyclePhase::Idle,
            frames: Vec::new(),
            best: None,
            state: FilterState {
                tree_size: 1,
                ..Default::default()
            },
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParticleFilterConfig {
        &self.config
    }

    /// Get current particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Get the number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Get current filter state (for diagnostics).
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Current cycle phase.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Trajectory hypothesis tree.
    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    /// Sensor model used by [`fuse`](Self::fuse).
    pub fn sensor_model(&self) -> &StereoSensorModel {
        &self.sensor_model
    }

    /// Map view of particle `index` including its latest evidence.
    pub fn lineage(&self, index: usize) -> Result<Lineage> {
        let particle = self.particle(index)?;
        Ok(self.tree.lineage(particle.path))
    }

    fn particle(&self, index: usize) -> Result<&Particle> {
        self.particles.get(index).ok_or(FilterError::UnknownParticle {
            index,
            total: self.particles.len(),
        })
    }

    fn require(&self, operation: &'static str, allowed: &[CyclePhase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(FilterError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cycle
    // ─────────────────────────────────────────────────────────────────────

    /// Prediction step: every particle spawns a child path node.
    ///
    /// With [`MotionInput::Odometry`] the child pose is sampled from the
    /// motion model; with [`MotionInput::GroundTruth`] it is the supplied
    /// pose.
    pub fn predict(&mut self, input: &MotionInput) -> Result<()> {
        self.require("predict", &[CyclePhase::Idle])?;

        for particle in &mut self.particles {
            let pose = match input {
                MotionInput::Odometry(odometry) => {
                    self.motion_model
                        .sample(&particle.pose, odometry, &mut self.noise)
                }
                MotionInput::GroundTruth(pose) => *pose,
            };
            let Some(child) = self.tree.spawn(particle.path, pose) else {
                warn!("[ParticleFilter] path {:?} missing from tree", particle.path);
                continue;
            };
            self.tree.retain(child);
            self.tree.release(particle.path);
            particle.path = child;
            particle.pose = pose;
            particle.log_score = None;
        }

        self.frames.clear();
        self.phase = CyclePhase::Predicted;
        Ok(())
    }

    /// Fuse step: insert each frame's evidence into the map, authored by
    /// each particle's new path node.
    ///
    /// Returns the number of cell updates. Frames with no usable features
    /// are a no-op.
    pub fn fuse(&mut self, grid: &mut DistributedGrid, frames: &[StereoFrame]) -> Result<usize> {
        self.require("fuse", &[CyclePhase::Predicted])?;

        let mut total = 0;
        for particle in &self.particles {
            let lineage = self.tree.lineage(particle.path);
            let mut written = 0;
            for frame in frames {
                if frame.is_empty() {
                    continue;
                }
                let Some(head) = self.config.heads.get(frame.head) else {
                    warn!("[ParticleFilter] frame from unknown head {}", frame.head);
                    continue;
                };
                let camera = head.camera_pose(&particle.pose);
                let rays = self.sensor_model.create_observation(
                    &camera,
                    &head.calibration,
                    &frame.features,
                    &frame.colours,
                    true,
                );
                for ray in &rays {
                    written += grid.insert_ray(ray, &lineage);
                }
            }
            if let Some(node) = self.tree.get_mut(particle.path) {
                node.cells_written += written;
            }
            total += written;
        }

        debug!(
            "[ParticleFilter] fused {} frames: {} cell updates",
            frames.len(),
            total
        );
        self.frames = frames.to_vec();
        self.phase = CyclePhase::Fused;
        Ok(total)
    }

    /// Score step: record a log-likelihood for every particle.
    ///
    /// Each particle is judged against its parent's view of the map, so its
    /// own fresh evidence cannot vouch for it. Runs in parallel with the
    /// `parallel` feature.
    pub fn score(&mut self, grid: &DistributedGrid, scorer: &dyn HypothesisScorer) -> Result<()> {
        self.require(
            "score",
            &[CyclePhase::Predicted, CyclePhase::Fused, CyclePhase::Scored],
        )?;

        let inputs: Vec<_> = self
            .particles
            .iter()
            .map(|p| (self.tree.lineage(p.path).without_leaf(), p.pose))
            .collect();
        let frames = &self.frames;
        let heads = &self.config.heads;
        let evaluate = |(lineage, pose): &(Lineage, Pose3D)| {
            scorer.log_likelihood(&Hypothesis {
                grid,
                lineage,
                pose,
                frames,
                heads,
            })
        };

        #[cfg(feature = "parallel")]
        let scores: Vec<f32> = {
            use rayon::prelude::*;
            inputs.par_iter().map(evaluate).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let scores: Vec<f32> = inputs.iter().map(evaluate).collect();

        for (index, score) in scores.into_iter().enumerate() {
            let score = if score.is_nan() {
                warn!("[ParticleFilter] NaN score for particle {}", index);
                f32::NEG_INFINITY
            } else {
                score
            };
            self.update_pose_score(index, score)?;
        }
        Ok(())
    }

    /// Record the log-likelihood of particle `index`.
    ///
    /// `-∞` marks an impossible hypothesis; NaN is rejected.
    pub fn update_pose_score(&mut self, index: usize, log_score: f32) -> Result<()> {
        self.require(
            "update_pose_score",
            &[CyclePhase::Predicted, CyclePhase::Fused, CyclePhase::Scored],
        )?;
        let total = self.particles.len();
        let particle = self
            .particles
            .get_mut(index)
            .ok_or(FilterError::UnknownParticle { index, total })?;
        if log_score.is_nan() {
            return Err(FilterError::InvalidScore { index });
        }
        particle.log_score = Some(log_score);

        if self.poses_evaluated() == total {
            self.phase = CyclePhase::Scored;
        }
        Ok(())
    }

    /// Number of particles scored this cycle.
    pub fn poses_evaluated(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| p.log_score.is_some())
            .count()
    }

    /// Resample step.
    ///
    /// Refuses with [`FilterError::IncompleteScoring`] until every particle
    /// is scored. Returns the best hypothesis of this cycle.
    pub fn resample(&mut self, grid: &mut DistributedGrid) -> Result<BestHypothesis> {
        let scored = self.poses_evaluated();
        let n = self.particles.len();
        if self.phase == CyclePhase::Idle {
            return Err(FilterError::InvalidPhase {
                operation: "resample",
                phase: self.phase,
            });
        }
        if scored < n {
            return Err(FilterError::IncompleteScoring { scored, total: n });
        }

        // Convert to normalized weights using log-sum-exp trick
        let log_weights: Vec<f64> = self
            .particles
            .iter()
            .map(|p| p.log_score.unwrap_or(f32::NEG_INFINITY) as f64)
            .collect();
        let max_log_weight = log_weights
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        if max_log_weight.is_finite() {
            let sum_exp: f64 = log_weights
                .iter()
                .map(|&lw| (lw - max_log_weight).exp())
                .sum();
            for (particle, lw) in self.particles.iter_mut().zip(&log_weights) {
                particle.weight = (lw - max_log_weight).exp() / sum_exp;
            }
        } else {
            warn!("[ParticleFilter] All particles have zero likelihood, using uniform weights");
            for particle in &mut self.particles {
                particle.weight = 1.0 / n as f64;
            }
        }

        let sum_sq: f64 = self.particles.iter().map(|p| p.weight * p.weight).sum();
        let neff = if sum_sq > 1e-10 { 1.0 / sum_sq } else { 0.0 };

        let best_old = self
            .particles
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.weight.total_cmp(&b.1.weight))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let best_particle = self.particles[best_old];

        // Systematic resampling
        let selected = self.systematic_indices();
        let old = std::mem::take(&mut self.particles);
        let mut particles = Vec::with_capacity(n);
        for &idx in &selected {
            let source = &old[idx];
            self.tree.retain(source.path);
            particles.push(Particle {
                path: source.path,
                pose: source.pose,
                log_score: None,
                weight: 1.0 / n as f64,
            });
        }
        self.particles = particles;

        let mut pruned_nodes = 0;
        for particle in &old {
            for dead in self.tree.release(particle.path) {
                pruned_nodes += grid.prune_author(dead);
            }
        }

        // The heaviest weight is at least 1/N, so systematic selection keeps it.
        let index = self
            .particles
            .iter()
            .position(|p| p.path == best_particle.path);
        debug_assert!(index.is_some(), "best particle dropped by resampling");
        let mut best = BestHypothesis {
            index: index.unwrap_or(0),
            path: best_particle.path,
            pose: best_particle.pose,
            weight: best_particle.weight,
            log_score: best_particle.log_score.unwrap_or(f32::NEG_INFINITY),
        };

        // Anti-degeneracy
        let ratio = neff / n as f64;
        if ratio < self.config.collapse_threshold {
            self.state.collapse_streak += 1;
        } else {
            self.state.collapse_streak = 0;
        }
        if self.state.collapse_streak >= self.config.collapse_cycles.max(1) {
            pruned_nodes += self.reseed(grid, &mut best);
            self.state.collapse_streak = 0;
        }

        let mut committed_cells = 0;
        for path in self.tree.commit_trunk() {
            committed_cells += grid.commit_author(path);
        }

        self.state.iterations += 1;
        self.state.neff = neff;
        self.state.max_weight = best.weight;
        self.state.tree_size = self.tree.len();
        self.state.committed_poses = self.tree.committed_len();
        self.state.pruned_nodes = pruned_nodes;
        self.state.committed_cells = committed_cells;

        debug!(
            "[ParticleFilter] cycle {}: neff={:.1}/{} tree={} pruned={} committed={}",
            self.state.iterations,
            neff,
            n,
            self.state.tree_size,
            pruned_nodes,
            committed_cells
        );

        self.frames.clear();
        self.best = Some(best);
        self.phase = CyclePhase::Idle;
        Ok(best)
    }

    /// Low-variance resampling indices from the current weights.
    fn systematic_indices(&mut self) -> Vec<usize> {
        let n = self.particles.len();

        let mut cumulative: Vec<f64> = Vec::with_capacity(n);
        let mut sum = 0.0;
        for p in &self.particles {
            sum += p.weight;
            cumulative.push(sum);
        }
        if sum > 1e-10 {
            for c in &mut cumulative {
                *c /= sum;
            }
        } else {
            for (i, c) in cumulative.iter_mut().enumerate() {
                *c = (i + 1) as f64 / n as f64;
            }
        }

        let step = 1.0 / n as f64;
        let mut r = self.noise.uniform() as f64 * step;
        let mut idx = 0;
        let mut selected = Vec::with_capacity(n);
        for _ in 0..n {
            while r > cumulative[idx] && idx < n - 1 {
                idx += 1;
            }
            selected.push(idx);
            r += step;
        }
        selected
    }

    /// Replace the tail of the population with perturbed copies of `best`.
    ///
    /// Copies are children of the best path, so they inherit its map.
    /// Returns the number of map nodes freed.
    fn reseed(&mut self, grid: &mut DistributedGrid, best: &mut BestHypothesis) -> usize {
        if self.tree.get(best.path).is_none() {
            warn!("[ParticleFilter] best path gone, skipping reseed");
            return 0;
        }

        let n = self.particles.len();
        let count = ((self.config.reseed_fraction.clamp(0.0, 1.0) * n as f32).round() as usize)
            .min(n.saturating_sub(1));
        let mut freed = 0;
        for i in n - count..n {
            let pose = Pose3D::new(
                best.pose.x + self.noise.gaussian(self.config.reseed_spread_mm),
                best.pose.y + self.noise.gaussian(self.config.reseed_spread_mm),
                best.pose.z,
                normalize_angle(best.pose.pan + self.noise.gaussian(self.config.reseed_spread_rad)),
                best.pose.tilt,
                best.pose.roll,
            );
            let Some(child) = self.tree.spawn(best.path, pose) else {
                break;
            };
            self.tree.retain(child);
            let old = std::mem::replace(
                &mut self.particles[i],
                Particle {
                    path: child,
                    pose,
                    log_score: None,
                    weight: 1.0 / n as f64,
                },
            );
            for dead in self.tree.release(old.path) {
                freed += grid.prune_author(dead);
            }
        }

        // Keep the reported index pointing at an unperturbed descendant
        if best.index >= n - count {
            best.index = self
                .particles
                .iter()
                .position(|p| p.path == best.path)
                .unwrap_or(0);
        }

        self.state.reseeds += 1;
        warn!(
            "[ParticleFilter] population collapsed, reseeded {} of {} particles",
            count, n
        );
        freed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Estimates
    // ─────────────────────────────────────────────────────────────────────

    /// Best hypothesis of the last resample, if any.
    pub fn best(&self) -> Option<&BestHypothesis> {
        self.best.as_ref()
    }

    /// Current pose of the particle descended from the last best hypothesis.
    pub fn best_pose(&self) -> Pose3D {
        let index = self.best.map(|b| b.index).unwrap_or(0);
        self.particles
            .get(index)
            .map(|p| p.pose)
            .unwrap_or_default()
    }

    /// Weighted mean pose. Angles use the circular mean.
    pub fn mean_pose(&self) -> Pose3D {
        let mut total = 0.0f64;
        let mut sum = [0.0f64; 3];
        let mut sin = [0.0f64; 3];
        let mut cos = [0.0f64; 3];

        for p in &self.particles {
            let w = p.weight;
            total += w;
            sum[0] += w * p.pose.x as f64;
            sum[1] += w * p.pose.y as f64;
            sum[2] += w * p.pose.z as f64;
            for (k, angle) in [p.pose.pan, p.pose.tilt, p.pose.roll].iter().enumerate() {
                sin[k] += w * (*angle as f64).sin();
                cos[k] += w * (*angle as f64).cos();
            }
        }

        if total <= 1e-10 {
            return self.best_pose();
        }
        let angle = |k: usize| sin[k].atan2(cos[k]) as f32;
        Pose3D::new(
            (sum[0] / total) as f32,
            (sum[1] / total) as f32,
            (sum[2] / total) as f32,
            angle(0),
            angle(1),
            angle(2),
        )
    }

    /// Trajectory of the best hypothesis, oldest pose first.
    pub fn best_trajectory(&self) -> Vec<Pose3D> {
        let index = self.best.map(|b| b.index).unwrap_or(0);
        self.particles
            .get(index)
            .map(|p| self.tree.trajectory(p.path))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Odometry, ReferencePoseScorer};
    use crate::grid::MapConfig;

    fn config(n: usize) -> ParticleFilterConfig {
        ParticleFilterConfig {
            num_particles: n,
            seed: 42,
            ..Default::default()
        }
    }

    fn cycle(
        filter: &mut ParticleFilter,
        grid: &mut DistributedGrid,
        scorer: &dyn HypothesisScorer,
    ) -> BestHypothesis {
        filter
            .predict(&MotionInput::Odometry(Odometry::forward(100.0, 1.0)))
            .unwrap();
        filter.fuse(grid, &[]).unwrap();
        filter.score(grid, scorer).unwrap();
        filter.resample(grid).unwrap()
    }

    #[test]
    fn test_phase_order_enforced() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let mut filter = ParticleFilter::new(config(5), Pose3D::identity());

        assert!(matches!(
            filter.fuse(&mut grid, &[]),
            Err(FilterError::InvalidPhase { .. })
        ));
        assert!(matches!(
            filter.resample(&mut grid),
            Err(FilterError::InvalidPhase { .. })
        ));

        filter
            .predict(&MotionInput::GroundTruth(Pose3D::at(0.0, 10.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(filter.phase(), CyclePhase::Predicted);
        assert!(filter.predict(&MotionInput::GroundTruth(Pose3D::identity())).is_err());
    }

    #[test]
    fn test_incomplete_scoring_refused() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let mut filter = ParticleFilter::new(config(4), Pose3D::identity());
        filter
            .predict(&MotionInput::Odometry(Odometry::forward(100.0, 1.0)))
            .unwrap();
        filter.update_pose_score(0, -1.0).unwrap();
        filter.update_pose_score(2, -2.0).unwrap();
        assert_eq!(filter.poses_evaluated(), 2);

        let err = filter.resample(&mut grid).unwrap_err();
        assert_eq!(err, FilterError::IncompleteScoring { scored: 2, total: 4 });
        // State untouched: finish scoring and resample
        filter.update_pose_score(1, -1.0).unwrap();
        filter.update_pose_score(3, -1.0).unwrap();
        assert_eq!(filter.phase(), CyclePhase::Scored);
        assert!(filter.resample(&mut grid).is_ok());
    }

    #[test]
    fn test_update_pose_score_validation() {
        let mut filter = ParticleFilter::new(config(3), Pose3D::identity());
        assert!(matches!(
            filter.update_pose_score(0, 1.0),
            Err(FilterError::InvalidPhase { .. })
        ));
        filter
            .predict(&MotionInput::GroundTruth(Pose3D::identity()))
            .unwrap();
        assert_eq!(
            filter.update_pose_score(9, 1.0),
            Err(FilterError::UnknownParticle { index: 9, total: 3 })
        );
        assert_eq!(
            filter.update_pose_score(1, f32::NAN),
            Err(FilterError::InvalidScore { index: 1 })
        );
    }

    #[test]
    fn test_resample_prefers_high_score() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let mut filter = ParticleFilter::new(config(4), Pose3D::identity());
        filter
            .predict(&MotionInput::Odometry(Odometry::forward(100.0, 1.0)))
            .unwrap();
        let winner_pose = filter.particles()[2].pose;
        for i in 0..4 {
            let score = if i == 2 { 0.0 } else { -100.0 };
            filter.update_pose_score(i, score).unwrap();
        }
        let best = filter.resample(&mut grid).unwrap();
        assert_eq!(best.pose, winner_pose);
        assert!(filter.particles().iter().all(|p| p.pose == winner_pose));
        assert!(filter.state().neff < 1.01);
    }

    #[test]
    fn test_best_index_points_at_best_path() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let mut filter = ParticleFilter::new(config(6), Pose3D::identity());
        filter
            .predict(&MotionInput::Odometry(Odometry::forward(100.0, 1.0)))
            .unwrap();
        let winner = filter.particles()[4];
        for i in 0..6 {
            let score = if i == 4 { 0.0 } else { -1.5 };
            filter.update_pose_score(i, score).unwrap();
        }
        let best = filter.resample(&mut grid).unwrap();
        assert_eq!(best.path, winner.path);
        assert_eq!(filter.particles()[best.index].path, best.path);
        assert_eq!(filter.particles()[best.index].pose, winner.pose);
    }

    #[test]
    fn test_tree_stays_bounded() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let mut filter = ParticleFilter::new(config(10), Pose3D::identity());
        let scorer = ReferencePoseScorer::new(Pose3D::identity(), 100.0);

        for _ in 0..20 {
            cycle(&mut filter, &mut grid, &scorer);
        }
        assert_eq!(filter.state().iterations, 20);
        assert_eq!(filter.best_trajectory().len(), 21);
        // Live nodes cannot exceed one branch per particle per uncommitted step
        let uncommitted = 21 - filter.state().committed_poses;
        assert!(filter.tree().len() <= 10 * uncommitted);
    }

    #[test]
    fn test_reseed_after_sustained_collapse() {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let mut cfg = config(10);
        cfg.collapse_threshold = 0.5;
        cfg.collapse_cycles = 2;
        let mut filter = ParticleFilter::new(cfg, Pose3D::identity());

        for cycle_index in 0..2 {
            filter
                .predict(&MotionInput::Odometry(Odometry::forward(100.0, 1.0)))
                .unwrap();
            for i in 0..10 {
                let score = if i == 0 { 0.0 } else { -500.0 };
                filter.update_pose_score(i, score).unwrap();
            }
            filter.resample(&mut grid).unwrap();
            assert_eq!(filter.state().reseeds, cycle_index);
        }
        assert_eq!(filter.state().reseeds, 1);
        assert_eq!(filter.state().collapse_streak, 0);

        let distinct = filter
            .particles()
            .iter()
            .filter(|p| p.pose != filter.particles()[0].pose)
            .count();
        assert_eq!(distinct, 5);
    }

    #[test]
    fn test_mean_pose_circular() {
        let mut filter = ParticleFilter::new(config(2), Pose3D::identity());
        filter
            .predict(&MotionInput::GroundTruth(Pose3D::at(0.0, 0.0, 0.0, 3.1)))
            .unwrap();
        filter.particles[1].pose.pan = -3.1;
        let mean = filter.mean_pose();
        assert!(mean.pan.abs() > 3.0, "pan {}", mean.pan);
    }
}
