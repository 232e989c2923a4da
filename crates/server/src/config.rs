//! Session configuration.
//!
//! Defaults come from the crate constants. A JSON file may override any
//! subset of fields; missing fields keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{
    COMMAND_RATE_LIMIT_PER_SEC, DEFAULT_COURSE_ID, FALL_THRESHOLD_Y, HOLE_TIME_LIMIT_SECS,
    MAX_HELD_MODIFIERS, MAX_PLAYERS, MAX_SPECTATORS, MAX_STROKES_PER_HOLE, NETWORK_RATE_HZ,
    PICKUP_RADIUS, POWER_SHOT_MULTIPLIER, REVIEW_DELAY_MS, SAFE_GROUND_Y, SPAWN_LIFT,
    TEE_SPACING, TICK_RATE_HZ,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seeds modifier rolls and tournament shuffles.
    pub seed: u64,
    pub tick_rate_hz: u32,
    pub network_rate_hz: u32,
    pub max_players: usize,
    pub max_spectators: usize,
    pub max_strokes_per_hole: u32,
    pub hole_time_limit_secs: u32,
    pub review_delay_ms: u64,
    pub max_held_modifiers: usize,
    pub pickup_radius: f64,
    pub fall_threshold_y: f64,
    pub safe_ground_y: f64,
    pub tee_spacing: f64,
    pub spawn_lift: f64,
    pub power_shot_multiplier: f64,
    pub max_stroke_impulse: f64,
    pub default_course_id: String,
    /// Start a casual match on `default_course_id` once everyone is ready.
    pub auto_start_when_ready: bool,
    pub command_rate_limit_per_sec: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_rate_hz: TICK_RATE_HZ,
            network_rate_hz: NETWORK_RATE_HZ,
            max_players: MAX_PLAYERS,
            max_spectators: MAX_SPECTATORS,
            max_strokes_per_hole: MAX_STROKES_PER_HOLE,
            hole_time_limit_secs: HOLE_TIME_LIMIT_SECS,
            review_delay_ms: REVIEW_DELAY_MS,
            max_held_modifiers: MAX_HELD_MODIFIERS,
            pickup_radius: PICKUP_RADIUS,
            fall_threshold_y: FALL_THRESHOLD_Y,
            safe_ground_y: SAFE_GROUND_Y,
            tee_spacing: TEE_SPACING,
            spawn_lift: SPAWN_LIFT,
            power_shot_multiplier: POWER_SHOT_MULTIPLIER,
            max_stroke_impulse: fairway_sim::stroke::MAX_STROKE_IMPULSE,
            default_course_id: DEFAULT_COURSE_ID.to_string(),
            auto_start_when_ready: true,
            command_rate_limit_per_sec: COMMAND_RATE_LIMIT_PER_SEC,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("tick_rate_hz", self.tick_rate_hz),
            ("network_rate_hz", self.network_rate_hz),
            ("max_strokes_per_hole", self.max_strokes_per_hole),
            ("hole_time_limit_secs", self.hole_time_limit_secs),
            ("command_rate_limit_per_sec", self.command_rate_limit_per_sec),
        ];
        for (field, value) in rates {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }

        if self.max_players == 0 {
            return Err(ConfigError::Invalid {
                field: "max_players",
                reason: "must be greater than zero",
            });
        }

        let reals = [
            ("pickup_radius", self.pickup_radius),
            ("fall_threshold_y", self.fall_threshold_y),
            ("safe_ground_y", self.safe_ground_y),
            ("tee_spacing", self.tee_spacing),
            ("spawn_lift", self.spawn_lift),
            ("power_shot_multiplier", self.power_shot_multiplier),
            ("max_stroke_impulse", self.max_stroke_impulse),
        ];
        for (field, value) in reals {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be finite",
                });
            }
        }

        if self.fall_threshold_y >= self.safe_ground_y {
            return Err(ConfigError::Invalid {
                field: "fall_threshold_y",
                reason: "must be below safe_ground_y",
            });
        }

        Ok(())
    }

    /// Commands accepted per participant within one physics tick.
    pub fn commands_per_tick(&self) -> u32 {
        self.command_rate_limit_per_sec.div_ceil(self.tick_rate_hz)
    }

    pub fn physics_period(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz
    }
}

// ============================================================================
// Tests
// ============================================================================
