//! Stroke application.

use glam::DVec3;

use crate::BodyId;
use crate::world::PhysicsWorld;

/// Impulse in N·s delivered by a full-power stroke with no multiplier.
pub const MAX_STROKE_IMPULSE: f64 = 0.2;

/// Converts an aim direction and power into a planar impulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeController {
    max_impulse: f64,
}

impl Default for StrokeController {
    fn default() -> Self {
        Self::new(MAX_STROKE_IMPULSE)
    }
}

impl StrokeController {
    pub fn new(max_impulse: f64) -> Self {
        Self { max_impulse }
    }

    pub fn max_impulse(&self) -> f64 {
        self.max_impulse
    }

    /// Strike `body` along `(dir_x, dir_z)`.
    ///
    /// The direction is normalised and `power` is clamped to `[0, 1]`; the
    /// impulse magnitude is `power × max_impulse × multiplier`. A zero-length
    /// or non-finite direction is a no-op. Returns the applied impulse.
    pub fn strike(
        &self,
        world: &mut PhysicsWorld,
        body: BodyId,
        dir_x: f64,
        dir_z: f64,
        power: f64,
        multiplier: f64,
    ) -> Option<DVec3> {
        let length = (dir_x * dir_x + dir_z * dir_z).sqrt();
        if !length.is_finite() || length == 0.0 {
            return None;
        }

        let power = if power.is_nan() { 0.0 } else { power.clamp(0.0, 1.0) };
        let magnitude = power * self.max_impulse * multiplier;
        let impulse = DVec3::new(dir_x / length * magnitude, 0.0, dir_z / length * magnitude);

        world.apply_impulse(body, impulse).then_some(impulse)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BALL_MASS;

    fn world_with_ball() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(60);
        world.add_body(1, DVec3::ZERO);
        world
    }

    #[test]
    fn test_full_power_stroke_has_max_magnitude() {
        let mut world = world_with_ball();
        let controller = StrokeController::default();

        let impulse = controller.strike(&mut world, 1, 0.0, 1.0, 1.0, 1.0).unwrap();

        assert!((impulse.length() - MAX_STROKE_IMPULSE).abs() < 1e-12);
        assert_eq!(impulse.y, 0.0);
        let velocity = world.velocity(1).unwrap();
        assert!((velocity.z * BALL_MASS - MAX_STROKE_IMPULSE).abs() < 1e-12);
    }

    #[test]
    fn test_direction_is_normalised() {
        let mut world = world_with_ball();
        let controller = StrokeController::new(1.0);

        let impulse = controller.strike(&mut world, 1, 3.0, 4.0, 0.5, 1.0).unwrap();

        assert!((impulse.x - 0.3).abs() < 1e-12);
        assert!((impulse.z - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_power_is_clamped_and_multiplied() {
        let mut world = world_with_ball();
        let controller = StrokeController::new(1.0);

        let impulse = controller.strike(&mut world, 1, 1.0, 0.0, 7.0, 1.5).unwrap();
        assert!((impulse.length() - 1.5).abs() < 1e-12);

        let impulse = controller.strike(&mut world, 1, 1.0, 0.0, -1.0, 1.0).unwrap();
        assert_eq!(impulse.length(), 0.0);
    }

    #[test]
    fn test_zero_direction_is_noop() {
        let mut world = world_with_ball();
        let controller = StrokeController::default();

        assert_eq!(controller.strike(&mut world, 1, 0.0, 0.0, 1.0, 1.0), None);
        assert_eq!(world.velocity(1), Some(DVec3::ZERO));
    }

    #[test]
    fn test_missing_body_is_noop() {
        let mut world = PhysicsWorld::new(60);
        let controller = StrokeController::default();
        assert_eq!(controller.strike(&mut world, 9, 1.0, 0.0, 1.0, 1.0), None);
    }
}
