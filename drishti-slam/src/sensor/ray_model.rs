//! Precomputed range distributions per (image column, disparity).
//!
//! A disparity measurement with Gaussian pixel error maps to a skewed
//! distribution over range: small disparities spread over many range bins.
//! Off-axis columns see longer rays for the same depth, so entries are also
//! keyed by column group.
//!
//! ```text
//! entries[group * max_disparity + (disparity - 1)]
//!   = RangeDistribution { start_bin, probabilities[..] }
//! ```
//!
//! Tables are built once per calibration and persisted with
//! [`crate::io::save_ray_model`].

use std::path::Path;

use log::{info, warn};

use crate::core::create_gaussian_lookup;
use crate::io::{IoError, load_ray_model, save_ray_model};

use super::observation::SensorModelConfig;
use super::stereo::StereoCalibration;

/// Disparity samples taken across ±3σ when building a distribution.
const DISPARITY_SAMPLES: usize = 15;

/// Probability over consecutive range bins.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeDistribution {
    /// Index of the first bin
    pub start_bin: u32,
    /// Probability per bin, summing to 1
    pub probabilities: Vec<f32>,
}

impl RangeDistribution {
    /// Expected range (mm) for bins of `bin_mm`.
    pub fn mean_mm(&self, bin_mm: f32) -> f32 {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| p * (self.start_bin as f32 + i as f32 + 0.5) * bin_mm)
            .sum()
    }

    /// Standard deviation of the range (mm).
    pub fn std_dev_mm(&self, bin_mm: f32) -> f32 {
        let mean = self.mean_mm(bin_mm);
        let variance: f32 = self
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let r = (self.start_bin as f32 + i as f32 + 0.5) * bin_mm;
                p * (r - mean) * (r - mean)
            })
            .sum();
        variance.max(0.0).sqrt()
    }

    /// Largest bin probability.
    pub fn peak(&self) -> f32 {
        self.probabilities.iter().copied().fold(0.0, f32::max)
    }
}

/// Immutable (column, disparity) → range distribution table.
#[derive(Clone, Debug, PartialEq)]
pub struct RayModelLookup {
    calibration: StereoCalibration,
    column_group: u32,
    max_disparity: u32,
    bin_mm: f32,
    entries: Vec<RangeDistribution>,
}

impl RayModelLookup {
    /// Build the table for a calibration.
    pub fn build(calibration: &StereoCalibration, config: &SensorModelConfig) -> Self {
        let column_group = config.column_group.max(1);
        let max_disparity = config.max_disparity.max(1);
        let bin_mm = config.range_bin_mm.max(1.0);
        let groups = (calibration.image_width as u32).div_ceil(column_group).max(1);
        let max_bin = (config.max_range_mm / bin_mm).ceil().max(1.0) as u32;

        let focal = calibration.focal_length_pixels();
        let (cx, _) = calibration.principal_point();
        let fb = focal * calibration.baseline_mm;
        let sigma = config.disparity_error_pixels.max(1e-3);
        let weights = create_gaussian_lookup(DISPARITY_SAMPLES);
        let half = DISPARITY_SAMPLES as f32 / 2.0;

        let capacity =
            Self::entry_count(calibration.image_width, column_group, max_disparity).unwrap_or(0);
        let mut entries = Vec::with_capacity(capacity);
        for group in 0..groups {
            let column = (group
                .saturating_mul(column_group)
                .saturating_add(column_group / 2) as f32)
                .min(calibration.image_width.saturating_sub(1) as f32);
            let off_axis = (column - cx) / focal;
            let ray_scale = (1.0 + off_axis * off_axis).sqrt();

            for disparity in 1..=max_disparity {
                let bins: Vec<(u32, f32)> = weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let offset = (k as f32 + 0.5 - half) / half * 3.0 * sigma;
                        let d = disparity as f32 + offset;
                        let bin = if d > 0.0 {
                            ((fb / d * ray_scale / bin_mm) as u32).min(max_bin)
                        } else {
                            max_bin
                        };
                        (bin, *w)
                    })
                    .collect();

                let start = bins.iter().map(|(b, _)| *b).min().unwrap_or(0);
                let end = bins.iter().map(|(b, _)| *b).max().unwrap_or(0);
                let mut probabilities = vec![0.0f32; (end - start + 1) as usize];
                for (bin, w) in bins {
                    probabilities[(bin - start) as usize] += w;
                }
                let sum: f32 = probabilities.iter().sum();
                if sum > 0.0 {
                    probabilities.iter_mut().for_each(|p| *p /= sum);
                }
                entries.push(RangeDistribution {
                    start_bin: start,
                    probabilities,
                });
            }
        }

        Self {
            calibration: calibration.clone(),
            column_group,
            max_disparity,
            bin_mm,
            entries,
        }
    }

    /// Assemble a table from parts, validating the entry count.
    pub fn from_parts(
        calibration: StereoCalibration,
        column_group: u32,
        max_disparity: u32,
        bin_mm: f32,
        entries: Vec<RangeDistribution>,
    ) -> Result<Self, IoError> {
        if column_group == 0 || max_disparity == 0 || bin_mm.is_nan() || bin_mm <= 0.0 {
            return Err(IoError::InvalidFormat("Invalid ray model layout".to_string()));
        }
        let expected = Self::entry_count(calibration.image_width, column_group, max_disparity)
            .ok_or_else(|| IoError::InvalidFormat("Ray model layout too large".to_string()))?;
        if entries.len() != expected {
            return Err(IoError::InvalidFormat(format!(
                "Expected {} entries, found {}",
                expected,
                entries.len()
            )));
        }
        Ok(Self {
            calibration,
            column_group,
            max_disparity,
            bin_mm,
            entries,
        })
    }

    /// Entries in a table of the given layout, `None` on overflow or an
    /// empty layout.
    pub fn entry_count(image_width: usize, column_group: u32, max_disparity: u32) -> Option<usize> {
        if column_group == 0 || max_disparity == 0 {
            return None;
        }
        let groups = (image_width as u64).div_ceil(column_group as u64).max(1);
        let entries = groups.checked_mul(max_disparity as u64)?;
        usize::try_from(entries).ok()
    }

    /// Calibration the table was built for.
    pub fn calibration(&self) -> &StereoCalibration {
        &self.calibration
    }

    /// Columns per entry group.
    pub fn column_group(&self) -> u32 {
        self.column_group
    }

    /// Largest disparity covered.
    pub fn max_disparity(&self) -> u32 {
        self.max_disparity
    }

    /// Range bin size (mm).
    pub fn bin_mm(&self) -> f32 {
        self.bin_mm
    }

    /// All entries, group major.
    pub fn entries(&self) -> &[RangeDistribution] {
        &self.entries
    }

    /// Distribution for a pixel column and (rounded) disparity.
    pub fn distribution(&self, column: f32, disparity: f32) -> Option<&RangeDistribution> {
        if !column.is_finite() || !disparity.is_finite() || column < 0.0 {
            return None;
        }
        let d = disparity.round();
        if d < 1.0 || d > self.max_disparity as f32 {
            return None;
        }
        let group = column as u32 / self.column_group;
        let index = group as usize * self.max_disparity as usize + (d as usize - 1);
        self.entries.get(index)
    }

    /// Save to the binary artifact format.
    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        save_ray_model(self, path)
    }

    /// Load from the binary artifact format.
    pub fn load(path: &Path) -> Result<Self, IoError> {
        load_ray_model(path)
    }

    /// Load the artifact, or build from calibration when it is missing,
    /// malformed or built for a different calibration.
    pub fn load_or_build(
        path: &Path,
        calibration: &StereoCalibration,
        config: &SensorModelConfig,
    ) -> Self {
        match Self::load(path) {
            Ok(lookup) if lookup.calibration() == calibration => {
                info!("[RayModel] Loaded {}", path.display());
                lookup
            }
            Ok(_) => {
                warn!(
                    "[RayModel] {} was built for another calibration, rebuilding",
                    path.display()
                );
                Self::build(calibration, config)
            }
            Err(e) => {
                warn!(
                    "[RayModel] Failed to load {}: {}, rebuilding",
                    path.display(),
                    e
                );
                Self::build(calibration, config)
            }
        }
    }
}
