//! Contact profiles for ball collisions.
//!
//! Every static collider carries a [`ContactProfile`]. Surfaces pick one of
//! the four named [`SurfaceMaterial`]s; walls and obstacles share a single
//! wall profile, and ball-vs-ball contacts use their own profile.

use serde::{Deserialize, Serialize};

/// Friction and restitution pair applied when a ball touches something.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub friction: f64,
    pub restitution: f64,
}

impl ContactProfile {
    pub const fn new(friction: f64, restitution: f64) -> Self {
        Self {
            friction,
            restitution,
        }
    }
}

/// Playing surface material declared by hole data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMaterial {
    #[default]
    Grass,
    Sand,
    Ice,
    Rubber,
}

impl SurfaceMaterial {
    pub const ALL: [SurfaceMaterial; 4] = [Self::Grass, Self::Sand, Self::Ice, Self::Rubber];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Sand => "sand",
            Self::Ice => "ice",
            Self::Rubber => "rubber",
        }
    }
}

/// The full table of contact profiles registered against the ball material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactProfiles {
    pub grass: ContactProfile,
    pub sand: ContactProfile,
    pub ice: ContactProfile,
    pub rubber: ContactProfile,
    pub wall: ContactProfile,
    pub ball: ContactProfile,
}

impl Default for ContactProfiles {
    fn default() -> Self {
        Self {
            grass: ContactProfile::new(0.5, 0.3),
            sand: ContactProfile::new(0.9, 0.1),
            ice: ContactProfile::new(0.02, 0.5),
            rubber: ContactProfile::new(0.8, 0.9),
            wall: ContactProfile::new(0.1, 0.6),
            ball: ContactProfile::new(0.3, 0.5),
        }
    }
}

impl ContactProfiles {
    /// Profile for a ball rolling on the given surface material.
    pub fn surface(&self, material: SurfaceMaterial) -> ContactProfile {
        match material {
            SurfaceMaterial::Grass => self.grass,
            SurfaceMaterial::Sand => self.sand,
            SurfaceMaterial::Ice => self.ice,
            SurfaceMaterial::Rubber => self.rubber,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
