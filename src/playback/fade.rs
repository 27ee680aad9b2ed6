//! The fade primitive
//!
//! A [`FadeTask`] drives one continuous gain ramp from a start value to an
//! end value over a fixed duration, advanced cooperatively by the
//! scheduling tick. Cancellation stops further updates and leaves the
//! volume at whatever the ramp last computed; callers that need a defined
//! end state must await completion or set the value themselves.
//!
//! At most one task is ever attached to a channel — starting a new fade
//! on a channel with one running always cancels the old fade first.
//! [`crate::playback::channel::Channel::begin_fade`] enforces the
//! replacement rule; nothing else may attach a task.

use serde::{Deserialize, Serialize};

/// Easing curves for volume ramps
///
/// Every curve is monotonic and strictly increasing on [0, 1] with
/// f(0) = 0 and f(1) = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeCurve {
    /// v(t) = t
    Linear,

    /// v(t) = t² — slow start, fast finish
    EaseInQuad,

    /// v(t) = 0.5 × (1 - cos(π × t)) — smooth acceleration and deceleration
    SCurve,
}

impl FadeCurve {
    /// Multiplier at a normalized position (clamped to [0, 1])
    pub fn apply(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::EaseInQuad => t * t,
            FadeCurve::SCurve => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
        }
    }
}

impl Default for FadeCurve {
    fn default() -> Self {
        FadeCurve::EaseInQuad
    }
}

/// Lifecycle of a fade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    Running,
    Completed,
    Cancelled,
}

/// A single gain ramp from `from` to `to` over `duration` seconds
#[derive(Debug, Clone)]
pub struct FadeTask {
    from: f32,
    to: f32,
    duration: f64,
    elapsed: f64,
    curve: FadeCurve,
    state: FadeState,
}

impl FadeTask {
    /// A non-positive duration is the degenerate immediate-set case: the
    /// task is born `Completed` and the caller applies `to` synchronously.
    pub fn new(from: f32, to: f32, duration: f64, curve: FadeCurve) -> Self {
        let state = if duration <= 0.0 {
            FadeState::Completed
        } else {
            FadeState::Running
        };
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            curve,
            state,
        }
    }

    /// Advance by `dt` seconds and return the freshly computed volume
    ///
    /// Returns `None` once the task is no longer running. The step that
    /// reaches the end of the ramp returns exactly `to`.
    pub fn advance(&mut self, dt: f64) -> Option<f32> {
        if self.state != FadeState::Running {
            return None;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.state = FadeState::Completed;
            return Some(self.to);
        }
        let t = (self.elapsed / self.duration) as f32;
        Some(self.from + (self.to - self.from) * self.curve.apply(t))
    }

    /// Stop further updates without touching the channel volume
    pub fn cancel(&mut self) {
        if self.state == FadeState::Running {
            self.state = FadeState::Cancelled;
        }
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == FadeState::Running
    }

    /// End value of the ramp
    pub fn target(&self) -> f32 {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_both_endpoints() {
        for curve in [FadeCurve::Linear, FadeCurve::EaseInQuad, FadeCurve::SCurve] {
            assert!(
                curve.apply(0.0).abs() < 0.001,
                "{:?} at 0.0 should be ~0.0",
                curve
            );
            assert!(
                (curve.apply(1.0) - 1.0).abs() < 0.001,
                "{:?} at 1.0 should be ~1.0",
                curve
            );
        }
    }

    #[test]
    fn ease_in_quad_midpoint() {
        // t = 0.5 gives 0.25 on the quadratic ramp
        assert!((FadeCurve::EaseInQuad.apply(0.5) - 0.25).abs() < 0.001);
    }

    #[test]
    fn curve_input_clamped() {
        assert_eq!(FadeCurve::Linear.apply(-1.0), 0.0);
        assert_eq!(FadeCurve::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn final_step_returns_exact_target() {
        let mut fade = FadeTask::new(0.0, 0.7, 1.0, FadeCurve::EaseInQuad);
        for _ in 0..7 {
            fade.advance(0.125);
        }
        // Eighth step lands exactly on the duration
        assert_eq!(fade.advance(0.125), Some(0.7));
        assert_eq!(fade.state(), FadeState::Completed);
        assert_eq!(fade.advance(0.125), None);
    }

    #[test]
    fn trajectory_follows_curve() {
        let mut fade = FadeTask::new(0.0, 1.0, 2.0, FadeCurve::EaseInQuad);
        let v = fade.advance(1.0).unwrap();
        // Halfway through a 2 s quadratic ramp: 0.5² = 0.25
        assert!((v - 0.25).abs() < 0.001);
    }

    #[test]
    fn cancel_stops_updates() {
        let mut fade = FadeTask::new(0.2, 1.0, 1.0, FadeCurve::Linear);
        fade.advance(0.5);
        fade.cancel();
        assert_eq!(fade.state(), FadeState::Cancelled);
        assert_eq!(fade.advance(0.5), None);
    }

    #[test]
    fn cancel_after_completion_keeps_completed() {
        let mut fade = FadeTask::new(0.0, 1.0, 0.5, FadeCurve::Linear);
        fade.advance(1.0);
        fade.cancel();
        assert_eq!(fade.state(), FadeState::Completed);
    }

    #[test]
    fn non_positive_duration_completes_at_birth() {
        let fade = FadeTask::new(0.3, 0.9, 0.0, FadeCurve::EaseInQuad);
        assert_eq!(fade.state(), FadeState::Completed);
        let fade = FadeTask::new(0.3, 0.9, -1.0, FadeCurve::EaseInQuad);
        assert_eq!(fade.state(), FadeState::Completed);
        assert_eq!(fade.target(), 0.9);
    }
}
