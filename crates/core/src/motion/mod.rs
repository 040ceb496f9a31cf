//! Second-order "muscle" smoothing and idle relaxation.
//!
//! Every channel is an independent mass-spring-damper pulled towards the
//! target pose. The spring state survives chunk boundaries; exaggeration is
//! applied to the pose handed out, never fed back into the state, so the
//! settled output does not depend on the tick rate.

use std::f32::consts::TAU;

use crate::{
    config::{IdleConfig, MotionConfig},
    pose::{clamp01, Pose, CHANNELS, JAW},
};

/// Longest single integration step; longer ticks are split.
const MAX_SUBSTEP: f32 = 0.008;

#[derive(Debug, Clone)]
pub struct MotionFilter {
    config: MotionConfig,
    state: [f32; CHANNELS],
    velocity: [f32; CHANNELS],
}

impl MotionFilter {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: [0.0; CHANNELS],
            velocity: [0.0; CHANNELS],
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Current filtered pose, exaggeration included.
    pub fn position(&self) -> Pose {
        if !self.config.enabled {
            return Pose::new(self.state);
        }
        let gain = self.config.exaggeration;
        Pose::new(self.state.map(|value| value * gain))
    }

    pub fn velocity(&self) -> [f32; CHANNELS] {
        self.velocity
    }

    /// Clamps a measured frame delta into the configured range.
    pub fn clamp_dt(&self, dt: f64) -> f32 {
        let min = self.config.min_dt_ms / 1000.0;
        let max = self.config.max_dt_ms / 1000.0;
        if dt.is_nan() {
            return min;
        }
        (dt as f32).clamp(min, max)
    }

    /// Natural angular frequency of `channel`.
    pub fn omega(&self, channel: usize) -> f32 {
        let hz = if channel == JAW {
            self.config.jaw_frequency_hz
        } else {
            self.config.lip_frequency_hz
        };
        TAU * hz
    }

    /// Advances the springs by `dt` seconds towards `target`.
    ///
    /// The spring force is applied explicitly and the damping implicitly,
    /// in sub-steps of at most 8 ms, which keeps every channel stable for
    /// any dt inside the clamp range.
    pub fn step(&mut self, target: &Pose, dt: f32) -> Pose {
        if !self.config.enabled {
            self.state = *target.channels();
            self.velocity = [0.0; CHANNELS];
            return *target;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let substeps = (dt / MAX_SUBSTEP).ceil().max(1.0);
        let h = dt / substeps;
        let zeta = self.config.damping_ratio;
        for channel in 0..CHANNELS {
            let omega = self.omega(channel);
            let goal = clamp01(target.channel(channel));
            let mut position = self.state[channel];
            let mut velocity = self.velocity[channel];

            for _ in 0..substeps as u32 {
                velocity = (velocity + omega * omega * (goal - position) * h)
                    / (1.0 + 2.0 * zeta * omega * h);
                position = clamp01(position + velocity * h);
            }

            self.velocity[channel] = if velocity.is_finite() { velocity } else { 0.0 };
            self.state[channel] = position;
        }
        self.position()
    }

    /// Scales position and velocity by `factor`, used by idle relaxation.
    fn decay(&mut self, factor: f32) {
        for channel in 0..CHANNELS {
            self.state[channel] = clamp01(self.state[channel] * factor);
            self.velocity[channel] *= factor;
        }
    }
}

/// Exponential relaxation towards neutral while nothing is playing.
#[derive(Debug, Clone)]
pub struct IdleRelaxation {
    decay_rate: f32,
}

impl IdleRelaxation {
    pub fn new(config: &IdleConfig) -> Self {
        Self {
            decay_rate: config.decay_rate.max(0.0),
        }
    }

    pub fn relax(&self, filter: &mut MotionFilter, dt: f32) -> Pose {
        filter.decay((-self.decay_rate * dt).exp());
        filter.position()
    }
}
