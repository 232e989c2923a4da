//! Fairway Session Server
//!
//! The session server is the single source of truth for one shared match:
//! it owns the physics world, every player record, the modifier pickups and
//! effects, and the phase state machine that walks a match from lobby through
//! holes and courses.
//!
//! # Architecture
//!
//! - [`Orchestrator`] is the session aggregate. Every mutation goes through
//!   it, and it is driven by exactly one caller at a time.
//! - Inbound commands are validated at the edge ([`validation`]), queued
//!   ([`command_queue`]), and applied at the start of the next
//!   [`Orchestrator::advance`].
//! - Periodic work (physics tick, network tick, countdown) and delayed phase
//!   transitions are named jobs on a cancellable [`Scheduler`].
//! - Outbound traffic is collected as [`Outbound`] values and projected onto
//!   the wire types by [`sync`].
//! - [`runtime`] hosts one orchestrator per tokio task.

#![deny(unsafe_code)]

pub mod catalog;
pub mod command_queue;
pub mod config;
pub mod error;
pub mod identity;
pub mod modifier;
pub mod orchestrator;
pub mod player;
pub mod runtime;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod sync;
pub mod validation;

pub use catalog::{CourseCatalog, StaticCourseCatalog};
pub use config::SessionConfig;
pub use error::{CatalogError, ConfigError, IdentityError, RuntimeError, SessionError};
pub use modifier::{ModifierKind, ModifierSystem};
pub use orchestrator::{Notification, Orchestrator, Outbound};
pub use player::{Identity, Player, PlayerId};
pub use runtime::{
    Audience, Dispatch, OpenedSession, SessionHandle, SessionInput, SessionRegistry, spawn_session,
};
pub use scheduler::{Job, Scheduler};
pub use session::{MatchMode, Phase, SessionState};
pub use validation::{Command, CommandVerdict, MatchRequest};

// ============================================================================
// Session Parameters
// ============================================================================

/// Physics tick rate in Hz.
pub const TICK_RATE_HZ: u32 = 60;

/// Position broadcast rate in Hz.
pub const NETWORK_RATE_HZ: u32 = 20;

/// Maximum non-spectator participants.
pub const MAX_PLAYERS: usize = 8;

/// Maximum spectators on top of the participants.
pub const MAX_SPECTATORS: usize = 8;

/// Per-hole stroke cap; reaching it at rest finishes the hole.
pub const MAX_STROKES_PER_HOLE: u32 = 10;

/// Seconds each hole may run before it is forced to end.
pub const HOLE_TIME_LIMIT_SECS: u32 = 60;

/// Milliseconds between a hole or course ending and the next one starting.
pub const REVIEW_DELAY_MS: u64 = 5000;

/// Modifiers a player may hold at once.
pub const MAX_HELD_MODIFIERS: usize = 2;

/// Horizontal distance at which a ball collects a pickup.
pub const PICKUP_RADIUS: f64 = 0.15;

/// Bodies below this height have fallen off the course.
pub const FALL_THRESHOLD_Y: f64 = -2.0;

/// Bodies must be above this height for a safe position to be recorded.
pub const SAFE_GROUND_Y: f64 = -1.0;

/// Sideways spacing between balls on the tee, per colour index.
pub const TEE_SPACING: f64 = 0.05;

/// Height added when a ball is placed on the tee or respawned.
pub const SPAWN_LIFT: f64 = 0.05;

/// Stroke multiplier granted by a power shot.
pub const POWER_SHOT_MULTIPLIER: f64 = 1.5;

/// Course started when every lobby participant is ready.
pub const DEFAULT_COURSE_ID: &str = "windmill-woods";

/// Inbound command rate limit per participant.
pub const COMMAND_RATE_LIMIT_PER_SEC: u32 = 120;

/// Allowed tournament lengths, in courses.
pub const TOURNAMENT_LENGTHS: [u32; 3] = [3, 6, 9];
