//! Velocity motion model for the particle filter.
//!
//! Implements the velocity motion model from Probabilistic Robotics
//! (Thrun et al.) extended to a pan / tilt / roll body. Each commanded
//! velocity is perturbed by zero-mean Gaussian noise whose variance grows
//! with the magnitude of the motion and the duration of the step:
//!
//! ```text
//! v̂   = v   + ε((α1·v² + α2·ω²)·dt)
//! ω̂   = ω   + ε((α3·v² + α4·ω²)·dt)
//! γ̂   =       ε((α5·v² + α6·ω²)·dt)     final heading drift
//! ```
//!
//! Tilt and roll rates use the rotational pair (α3, α4) with their own
//! angular velocity. Translation follows the heading at the middle of the
//! step.

use serde::{Deserialize, Serialize};

use crate::core::{NoiseGenerator, Pose3D, WorldPoint, normalize_angle};

/// Noise parameters of the velocity motion model.
///
/// Units: velocities in mm/s and rad/s, so `alpha1` and `alpha2` produce
/// mm², the rest rad².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionModelConfig {
    /// Speed noise from speed.
    pub alpha1: f32,
    /// Speed noise from turning (mm²·s²/rad²).
    pub alpha2: f32,
    /// Turn noise from speed (rad²·s²/mm²).
    pub alpha3: f32,
    /// Turn noise from turning.
    pub alpha4: f32,
    /// Heading drift from speed (rad²·s²/mm²).
    pub alpha5: f32,
    /// Heading drift from turning.
    pub alpha6: f32,
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self {
            alpha1: 0.01,
            alpha2: 100.0,
            alpha3: 1.0e-7,
            alpha4: 0.01,
            alpha5: 1.0e-8,
            alpha6: 0.001,
        }
    }
}

impl MotionModelConfig {
    /// Low-noise configuration (good wheel odometry).
    pub fn low_noise() -> Self {
        Self {
            alpha1: 0.002,
            alpha2: 20.0,
            alpha3: 2.0e-8,
            alpha4: 0.002,
            alpha5: 2.0e-9,
            alpha6: 0.0002,
        }
    }

    /// High-noise configuration (slippery floors, dead reckoning only).
    pub fn high_noise() -> Self {
        Self {
            alpha1: 0.05,
            alpha2: 500.0,
            alpha3: 5.0e-7,
            alpha4: 0.05,
            alpha5: 5.0e-8,
            alpha6: 0.005,
        }
    }

    /// No noise at all. Poses follow the commanded motion exactly.
    pub fn noiseless() -> Self {
        Self {
            alpha1: 0.0,
            alpha2: 0.0,
            alpha3: 0.0,
            alpha4: 0.0,
            alpha5: 0.0,
            alpha6: 0.0,
        }
    }
}

/// Commanded motion over one step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Odometry {
    /// Speed along the forward axis (mm/s)
    pub forward_velocity: f32,
    /// Turn rate about the vertical axis (rad/s)
    pub angular_velocity_pan: f32,
    /// Tilt rate (rad/s)
    pub angular_velocity_tilt: f32,
    /// Roll rate (rad/s)
    pub angular_velocity_roll: f32,
    /// Step duration (s)
    pub dt: f32,
}

impl Odometry {
    /// Straight-line motion.
    pub fn forward(forward_velocity: f32, dt: f32) -> Self {
        Self {
            forward_velocity,
            dt,
            ..Default::default()
        }
    }

    /// Planar motion with a turn rate.
    pub fn planar(forward_velocity: f32, angular_velocity_pan: f32, dt: f32) -> Self {
        Self {
            forward_velocity,
            angular_velocity_pan,
            dt,
            ..Default::default()
        }
    }

    /// True when the step moves nothing.
    pub fn is_stationary(&self) -> bool {
        self.dt <= 0.0
            || (self.forward_velocity == 0.0
                && self.angular_velocity_pan == 0.0
                && self.angular_velocity_tilt == 0.0
                && self.angular_velocity_roll == 0.0)
    }
}

/// Input driving a prediction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionInput {
    /// Sample poses from the motion model.
    Odometry(Odometry),
    /// Bypass the model: every particle moves to this pose.
    GroundTruth(Pose3D),
}

/// Velocity motion model for sampling particle poses.
#[derive(Debug, Clone)]
pub struct MotionModel {
    config: MotionModelConfig,
}

impl MotionModel {
    /// Create a new motion model with the given configuration.
    pub fn new(config: MotionModelConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MotionModelConfig {
        &self.config
    }

    /// Sample a successor of `pose` under `odometry`.
    ///
    /// Non-finite or non-positive `dt` leaves the pose unchanged.
    pub fn sample(
        &self,
        pose: &Pose3D,
        odometry: &Odometry,
        noise: &mut NoiseGenerator,
    ) -> Pose3D {
        let dt = odometry.dt;
        if !dt.is_finite() || odometry.is_stationary() {
            return *pose;
        }

        let c = &self.config;
        let v = odometry.forward_velocity;
        let w = odometry.angular_velocity_pan;
        let wt = odometry.angular_velocity_tilt;
        let wr = odometry.angular_velocity_roll;
        let v2 = v * v;

        let v_hat = v + noise.sample_normal_distribution((c.alpha1 * v2 + c.alpha2 * w * w) * dt);
        let w_hat = w + noise.sample_normal_distribution((c.alpha3 * v2 + c.alpha4 * w * w) * dt);
        let wt_hat =
            wt + noise.sample_normal_distribution((c.alpha3 * v2 + c.alpha4 * wt * wt) * dt);
        let wr_hat =
            wr + noise.sample_normal_distribution((c.alpha3 * v2 + c.alpha4 * wr * wr) * dt);
        let gamma = noise.sample_normal_distribution((c.alpha5 * v2 + c.alpha6 * w * w) * dt);

        // Midpoint heading for the translation
        let mid = Pose3D::new(
            0.0,
            0.0,
            0.0,
            pose.pan + 0.5 * w_hat * dt,
            pose.tilt + 0.5 * wt_hat * dt,
            0.0,
        );
        let travel: WorldPoint = mid.forward() * (v_hat * dt);

        Pose3D::new(
            pose.x + travel.x,
            pose.y + travel.y,
            pose.z + travel.z,
            normalize_angle(pose.pan + w_hat * dt + gamma * dt),
            normalize_angle(pose.tilt + wt_hat * dt),
            normalize_angle(pose.roll + wr_hat * dt),
        )
    }
}
