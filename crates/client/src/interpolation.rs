//! Position smoothing between network ticks.
//!
//! Positions arrive at the network rate, well below the render rate. Each
//! ball eases from its rendered position toward the latest authoritative
//! one with a frame-rate independent exponential factor.

use std::collections::BTreeMap;

use fairway_wire::PlayerId;
use glam::DVec3;

/// Fraction of the remaining distance left after one second of smoothing.
pub const SMOOTHING_BASE: f64 = 0.001;

/// Blend factor for a frame of `dt` seconds.
pub fn smoothing_factor(dt: f64) -> f64 {
    1.0 - SMOOTHING_BASE.powf(dt.max(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ball {
    current: DVec3,
    target: DVec3,
}

#[derive(Debug, Clone, Default)]
pub struct BallSmoother {
    balls: BTreeMap<PlayerId, Ball>,
}

impl BallSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set where `id` should move to. A ball seen for the first time snaps.
    pub fn set_target(&mut self, id: PlayerId, target: DVec3) {
        self.balls
            .entry(id)
            .and_modify(|ball| ball.target = target)
            .or_insert(Ball {
                current: target,
                target,
            });
    }

    /// Teleport `id` to `position` with no easing.
    pub fn snap(&mut self, id: PlayerId, position: DVec3) {
        self.balls.insert(
            id,
            Ball {
                current: position,
                target: position,
            },
        );
    }

    pub fn remove(&mut self, id: PlayerId) {
        self.balls.remove(&id);
    }

    /// Drop every ball not in `ids`.
    pub fn retain(&mut self, mut keep: impl FnMut(PlayerId) -> bool) {
        self.balls.retain(|id, _| keep(*id));
    }

    pub fn clear(&mut self) {
        self.balls.clear();
    }

    /// Advance every ball by a frame of `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        let factor = smoothing_factor(dt);
        for ball in self.balls.values_mut() {
            ball.current = ball.current.lerp(ball.target, factor);
        }
    }

    /// Rendered position.
    pub fn position(&self, id: PlayerId) -> Option<DVec3> {
        self.balls.get(&id).map(|ball| ball.current)
    }

    pub fn target(&self, id: PlayerId) -> Option<DVec3> {
        self.balls.get(&id).map(|ball| ball.target)
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
