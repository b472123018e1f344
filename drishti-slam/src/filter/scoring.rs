//! Hypothesis scoring.
//!
//! A scorer returns the log-likelihood of one trajectory hypothesis given
//! the current observation. The filter turns log-likelihoods into
//! normalized weights with the log-sum-exp trick, so scores only need to be
//! comparable within one cycle.

use crate::core::{Lineage, Pose3D};
use crate::grid::{DistributedGrid, pixel_direction};
use crate::sensor::{StereoFrame, StereoHead};

/// Everything a scorer may look at for one particle.
#[derive(Clone, Copy)]
pub struct Hypothesis<'a> {
    /// Shared map
    pub grid: &'a DistributedGrid,
    /// Map view before this particle's own fresh evidence
    pub lineage: &'a Lineage,
    /// Robot pose proposed by the prediction step
    pub pose: &'a Pose3D,
    /// Frames fused this cycle
    pub frames: &'a [StereoFrame],
    /// Stereo heads, indexed by [`StereoFrame::head`]
    pub heads: &'a [StereoHead],
}

/// Trait for particle scoring used by the filter.
///
/// Scorers are shared across threads when the `parallel` feature is on.
pub trait HypothesisScorer: Send + Sync {
    /// Compute log(p(observation | pose, map)).
    fn log_likelihood(&self, hypothesis: &Hypothesis<'_>) -> f32;
}

/// Configuration for [`RangeResidualScorer`].
#[derive(Debug, Clone, Copy)]
pub struct RangeScorerConfig {
    /// Weight for the Gaussian "hit" component.
    pub z_hit: f32,

    /// Weight for the uniform component.
    pub z_random: f32,

    /// Extra uniform weight when the map predicts nothing along the ray.
    pub z_unknown: f32,

    /// Standard deviation of the hit component at zero range (mm).
    pub sigma_mm: f32,

    /// Growth of the hit deviation with range (mm per mm).
    pub sigma_per_mm: f32,

    /// Upper bound on rays scored per frame.
    pub max_rays: usize,

    /// Treat the ground plane as an obstacle when predicting ranges.
    pub use_ground_plane: bool,
}

impl Default for RangeScorerConfig {
    fn default() -> Self {
        Self {
            z_hit: 0.85,
            z_random: 0.1,
            z_unknown: 0.05,
            sigma_mm: 40.0,
            sigma_per_mm: 0.02,
            max_rays: 256,
            use_ground_plane: true,
        }
    }
}

/// Compares each observed range with the range predicted by probing the
/// hypothesis's map.
///
/// Only observations within `radius_mm` are used; the map's prediction
/// along each ray is limited to the same radius. Per-ray likelihood:
///
/// ```text
/// p = z_hit · N(observed - predicted; σ(observed)) + z_random / radius
/// p = (z_random + z_unknown) / radius                 nothing predicted
/// ```
#[derive(Debug, Clone)]
pub struct RangeResidualScorer {
    config: RangeScorerConfig,
    radius_mm: f32,
}

impl RangeResidualScorer {
    /// Create a scorer limited to `radius_mm` (usually the map's
    /// localisation radius).
    pub fn new(config: RangeScorerConfig, radius_mm: f32) -> Self {
        Self {
            config,
            radius_mm: radius_mm.max(1.0),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RangeScorerConfig {
        &self.config
    }

    /// Scoring radius (mm).
    pub fn radius_mm(&self) -> f32 {
        self.radius_mm
    }

    fn ray_likelihood(&self, observed: f32, predicted: Option<f32>) -> f32 {
        let uniform = self.config.z_random / self.radius_mm;
        match predicted {
            Some(predicted) => {
                let sigma = self.config.sigma_mm + self.config.sigma_per_mm * observed;
                let r = (observed - predicted) / sigma;
                let gaussian =
                    (-0.5 * r * r).exp() / (sigma * (2.0 * std::f32::consts::PI).sqrt());
                self.config.z_hit * gaussian + uniform
            }
            None => uniform + self.config.z_unknown / self.radius_mm,
        }
    }
}

impl HypothesisScorer for RangeResidualScorer {
    fn log_likelihood(&self, hypothesis: &Hypothesis<'_>) -> f32 {
        let mut log_likelihood = 0.0;

        for frame in hypothesis.frames {
            let Some(head) = hypothesis.heads.get(frame.head) else {
                continue;
            };
            let calibration = &head.calibration;
            if !calibration.is_valid() {
                continue;
            }
            let camera = head.camera_pose(hypothesis.pose);
            let origin = camera.position();
            let rotation = camera.rotation();
            let focal = calibration.focal_length_pixels();

            let usable = frame.features.iter().filter(|f| f.is_usable()).count();
            let stride = usable.div_ceil(self.config.max_rays.max(1)).max(1);

            for feature in frame.features.iter().filter(|f| f.is_usable()).step_by(stride) {
                let Some(depth) = calibration.depth(feature.disparity) else {
                    continue;
                };
                let local = pixel_direction(
                    feature.column,
                    feature.row,
                    calibration.image_width,
                    calibration.image_height,
                    focal,
                );
                let observed = depth * local.length();
                if observed > self.radius_mm {
                    continue;
                }

                let direction = rotation.rotate(&local);
                let predicted = hypothesis.grid.probe_range_limited(
                    &origin,
                    &direction,
                    hypothesis.lineage,
                    self.config.use_ground_plane,
                    self.radius_mm,
                );
                log_likelihood += self.ray_likelihood(observed, predicted).ln();
            }
        }
        log_likelihood
    }
}

/// Scores by closeness to a known reference pose.
///
/// Weight ∝ 1 / (1 + d / scale), with d the position distance. Useful for
/// evaluating the filter against ground truth.
#[derive(Debug, Clone)]
pub struct ReferencePoseScorer {
    reference: Pose3D,
    scale_mm: f32,
}

impl ReferencePoseScorer {
    /// Create a scorer around `reference`.
    pub fn new(reference: Pose3D, scale_mm: f32) -> Self {
        Self {
            reference,
            scale_mm: scale_mm.max(f32::EPSILON),
        }
    }

    /// Move the reference.
    pub fn set_reference(&mut self, reference: Pose3D) {
        self.reference = reference;
    }

    /// Current reference pose.
    pub fn reference(&self) -> &Pose3D {
        &self.reference
    }
}

impl HypothesisScorer for ReferencePoseScorer {
    fn log_likelihood(&self, hypothesis: &Hypothesis<'_>) -> f32 {
        let d = hypothesis.pose.distance(&self.reference);
        -(1.0 + d / self.scale_mm).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldPoint;
    use crate::grid::MapConfig;
    use crate::sensor::{StereoFeature, synthesize_features};

    fn wall_grid() -> DistributedGrid {
        let mut grid = DistributedGrid::new(MapConfig::fine());
        let committed = Lineage::committed_only();
        grid.insert_wall(
            &WorldPoint::new(-1500.0, 1000.0, 0.0),
            &WorldPoint::new(1500.0, 1000.0, 0.0),
            700.0,
            &committed,
        );
        grid
    }

    fn frame_from(grid: &DistributedGrid, pose: &Pose3D, head: &StereoHead) -> StereoFrame {
        let camera = head.camera_pose(pose);
        let features = synthesize_features(
            grid,
            &Lineage::committed_only(),
            &camera,
            &head.calibration,
            16,
        );
        StereoFrame::new(0, features, Vec::new())
    }

    #[test]
    fn test_true_pose_scores_highest() {
        let grid = wall_grid();
        let heads = vec![StereoHead::default()];
        let truth = Pose3D::identity();
        let frames = vec![frame_from(&grid, &truth, &heads[0])];
        assert!(!frames[0].is_empty());

        let scorer = RangeResidualScorer::new(RangeScorerConfig::default(), 3000.0);
        let lineage = Lineage::committed_only();
        let score = |pose: &Pose3D| {
            scorer.log_likelihood(&Hypothesis {
                grid: &grid,
                lineage: &lineage,
                pose,
                frames: &frames,
                heads: &heads,
            })
        };

        let at_truth = score(&truth);
        let shifted = score(&Pose3D::at(0.0, 300.0, 0.0, 0.0));
        assert!(
            at_truth > shifted,
            "truth {} should beat shifted {}",
            at_truth,
            shifted
        );
    }

    #[test]
    fn test_unusable_features_ignored() {
        let grid = wall_grid();
        let heads = vec![StereoHead::default()];
        let mut invalid = StereoFeature::new(160.0, 120.0, 10.0);
        invalid.valid = false;
        let frames = vec![StereoFrame::new(0, vec![invalid], Vec::new())];
        let scorer = RangeResidualScorer::new(RangeScorerConfig::default(), 3000.0);
        let lineage = Lineage::committed_only();
        let score = scorer.log_likelihood(&Hypothesis {
            grid: &grid,
            lineage: &lineage,
            pose: &Pose3D::identity(),
            frames: &frames,
            heads: &heads,
        });
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_reference_pose_scorer() {
        let grid = DistributedGrid::new(MapConfig::fine());
        let lineage = Lineage::committed_only();
        let scorer = ReferencePoseScorer::new(Pose3D::at(100.0, 0.0, 0.0, 0.0), 50.0);
        let score = |pose: Pose3D| {
            scorer.log_likelihood(&Hypothesis {
                grid: &grid,
                lineage: &lineage,
                pose: &pose,
                frames: &[],
                heads: &[],
            })
        };
        assert_eq!(score(Pose3D::at(100.0, 0.0, 0.0, 0.0)), 0.0);
        assert!(score(Pose3D::at(0.0, 0.0, 0.0, 0.0)) < score(Pose3D::at(80.0, 0.0, 0.0, 0.0)));
    }
}
