//! Turns hole data into static colliders and a target-zone predicate.

use glam::DVec3;

use crate::course::Hole;
use crate::world::{PhysicsWorld, StaticCollider};

/// Radius of the target opening.
pub const TARGET_RADIUS: f64 = 0.05;

/// Horizontal capture distance as a multiple of the target radius.
pub const TARGET_CAPTURE_FACTOR: f64 = 1.8;

/// Maximum vertical offset between ball centre and target.
pub const TARGET_VERTICAL_TOLERANCE: f64 = 0.15;

/// Balls at or above this speed roll over the opening.
pub const TARGET_MAX_SPEED: f64 = 1.0;

/// Replace the world's static geometry with the colliders of `hole`.
///
/// Returns the number of colliders added.
pub fn build_hole(world: &mut PhysicsWorld, hole: &Hole) -> usize {
    world.clear_static_geometry();
    let profiles = *world.profiles();

    for surface in &hole.surfaces {
        let mut collider = StaticCollider::new(
            surface.position,
            surface.size * 0.5,
            profiles.surface(surface.material),
        );
        if let Some(euler) = surface.rotation {
            collider = collider.with_euler(euler);
        }
        world.add_static_geometry(collider);
    }

    for wall in &hole.walls {
        let mut collider = StaticCollider::new(wall.position, wall.size * 0.5, profiles.wall);
        if let Some(euler) = wall.rotation {
            collider = collider.with_euler(euler);
        }
        world.add_static_geometry(collider);
    }

    for obstacle in &hole.obstacles {
        let mut collider =
            StaticCollider::new(obstacle.position, obstacle.scale * 0.5, profiles.wall);
        if let Some(euler) = obstacle.rotation {
            collider = collider.with_euler(euler);
        }
        world.add_static_geometry(collider);
    }

    world.static_count()
}

/// Detector for the hole's target using the default [`TARGET_RADIUS`].
pub fn target_detector(hole: &Hole) -> TargetDetector {
    TargetDetector::new(hole.target, TARGET_RADIUS)
}

/// Pure predicate deciding whether a ball has dropped into the target.
///
/// A ball counts as holed only when it is horizontally within
/// `TARGET_CAPTURE_FACTOR × radius`, vertically close to the target, and
/// slower than [`TARGET_MAX_SPEED`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDetector {
    target: DVec3,
    radius: f64,
}

impl TargetDetector {
    pub fn new(target: DVec3, radius: f64) -> Self {
        Self { target, radius }
    }

    pub fn target(&self) -> DVec3 {
        self.target
    }

    pub fn is_holed(&self, x: f64, y: f64, z: f64, speed: f64) -> bool {
        let dx = x - self.target.x;
        let dz = z - self.target.z;
        let horizontal = (dx * dx + dz * dz).sqrt();

        horizontal < self.radius * TARGET_CAPTURE_FACTOR
            && (y - self.target.y).abs() < TARGET_VERTICAL_TOLERANCE
            && speed < TARGET_MAX_SPEED
    }

    pub fn contains(&self, position: DVec3, speed: f64) -> bool {
        self.is_holed(position.x, position.y, position.z, speed)
    }
}

// ============================================================================
// Tests
// ============================================================================
