//! Fairway Simulation Core
//!
//! This crate owns the rigid-body world for one hole of mini golf: ball
//! bodies, static collision geometry built from hole data, and stroke
//! impulses. It is driven by the session orchestrator and is the only place
//! ball motion is computed.
//!
//! # Architecture Constraints
//!
//! The Simulation Core MUST NOT:
//! - Perform I/O operations (file, network, logging)
//! - Read wall-clock time (callers pass elapsed seconds to `step`)
//! - Use ambient randomness
//!
//! Bodies are iterated in `BodyId` order so that two worlds fed the same
//! calls produce bit-identical state (see [`PhysicsWorld::state_digest`]).

#![deny(unsafe_code)]

pub mod course;
pub mod geometry;
pub mod material;
pub mod stroke;
pub mod world;

pub use glam::{DQuat, DVec3};

pub use course::{Course, Hole, Obstacle, ObstacleKind, Surface, Wall, WallMaterial, Zone};
pub use geometry::{TargetDetector, build_hole, target_detector};
pub use material::{ContactProfile, ContactProfiles, SurfaceMaterial};
pub use stroke::StrokeController;
pub use world::{PhysicsWorld, StaticCollider};

// ============================================================================
// Type Aliases
// ============================================================================

/// A single fixed physics substep counter.
pub type Tick = u64;

/// Identifier of a movable body. The orchestrator uses the participant id.
///
/// The world never assumes ids are contiguous or start at a particular value;
/// they are used only as stable ordering keys.
pub type BodyId = u32;

// ============================================================================
// Ball Constants
// ============================================================================

/// Downward gravity in m/s².
pub const GRAVITY: f64 = -9.82;

/// Default ball radius in metres.
pub const BALL_RADIUS: f64 = 0.02;

/// Ball mass in kilograms.
pub const BALL_MASS: f64 = 0.045;

/// Fraction of linear velocity lost per second.
pub const LINEAR_DAMPING: f64 = 0.4;

/// Fraction of angular velocity lost per second.
pub const ANGULAR_DAMPING: f64 = 0.4;

/// Linear speed below which a ball counts as resting.
pub const REST_LINEAR_SPEED: f64 = 0.005;

/// Angular speed below which a ball counts as resting.
pub const REST_ANGULAR_SPEED: f64 = 0.01;

/// How long both rest thresholds must hold before `is_at_rest` reports true.
pub const REST_SUSTAIN_SECONDS: f64 = 0.1;

/// Speed below which the engine starts counting towards sleep.
///
/// Stricter than [`REST_LINEAR_SPEED`]: a ball is reported at rest well
/// before the engine stops integrating it.
pub const SLEEP_SPEED_LIMIT: f64 = 0.001;

/// Seconds a body must stay under [`SLEEP_SPEED_LIMIT`] before it sleeps.
pub const SLEEP_TIME_LIMIT: f64 = 0.5;

/// Maximum fixed substeps consumed by one `step` call.
pub const MAX_SUBSTEPS: u32 = 3;

/// Default physics rate in Hz.
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;
