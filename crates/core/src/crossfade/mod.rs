use crate::pose::Pose;

/// Blends a freshly activated chunk in from the pose the engine was showing
/// when it activated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossfade {
    from: Pose,
    started_at: f64,
    window: f64,
}

impl Crossfade {
    /// `window` is in seconds; a non-positive window disables blending.
    pub fn new(from: Pose, started_at: f64, window: f64) -> Self {
        Self {
            from,
            started_at,
            window: if window.is_finite() { window.max(0.0) } else { 0.0 },
        }
    }

    pub fn from_pose(&self) -> Pose {
        self.from
    }

    /// Ramp factor at `now`: 0 at activation, 1 once the window has elapsed.
    pub fn factor(&self, now: f64) -> f32 {
        if self.window <= 0.0 {
            return 1.0;
        }
        let progress = (now - self.started_at) / self.window;
        if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0) as f32
        }
    }

    pub fn is_complete(&self, now: f64) -> bool {
        self.factor(now) >= 1.0
    }

    pub fn apply(&self, target: &Pose, now: f64) -> Pose {
        let factor = self.factor(now);
        if factor >= 1.0 {
            *target
        } else {
            self.from.lerp(target, factor)
        }
    }
}
