//! Course and hole data.
//!
//! Hole data is authored outside this crate and loaded through serde. Vectors
//! are `[x, y, z]` arrays; rotations are XYZ Euler angles in radians.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::material::SurfaceMaterial;

/// A named sequence of holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub description: String,
    pub holes: Vec<Hole>,
}

impl Course {
    pub fn hole(&self, index: usize) -> Option<&Hole> {
        self.holes.get(index)
    }

    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    /// Sum of par over every hole.
    pub fn total_par(&self) -> u32 {
        self.holes.iter().map(|h| h.par).sum()
    }
}

/// One hole. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub id: u32,
    pub par: u32,
    pub tee: DVec3,
    pub target: DVec3,
    #[serde(default)]
    pub surfaces: Vec<Surface>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub modifier_spawns: Vec<DVec3>,
    /// Declared by hole data but not consulted by the simulation.
    #[serde(default)]
    pub water_hazards: Vec<Zone>,
    /// Declared by hole data but not consulted by the simulation.
    #[serde(default)]
    pub out_of_bounds: Vec<Zone>,
}

/// A box the ball rolls on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub position: DVec3,
    pub size: DVec3,
    #[serde(default)]
    pub rotation: Option<DVec3>,
    #[serde(default)]
    pub material: SurfaceMaterial,
}

/// Decorative wall material. Every wall collides with the same profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallMaterial {
    #[default]
    Wood,
    Stone,
    Rubber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub position: DVec3,
    pub size: DVec3,
    #[serde(default)]
    pub rotation: Option<DVec3>,
    #[serde(default)]
    pub material: WallMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Windmill,
    Bumper,
    Ramp,
    Loop,
    Spinner,
    Conveyor,
    Bridge,
}

/// An obstacle. Animated kinds collide as a static box; motion is visual only.
///
/// `scale` is the full box size on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub position: DVec3,
    #[serde(default)]
    pub rotation: Option<DVec3>,
    #[serde(default = "default_scale")]
    pub scale: DVec3,
}

fn default_scale() -> DVec3 {
    DVec3::ONE
}

/// An axis-aligned region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub position: DVec3,
    pub size: DVec3,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const STRAIGHT_HOLE: &str = r#"{
        "id": 1,
        "par": 2,
        "tee": [0.0, 0.0, -2.0],
        "target": [0.0, 0.0, 2.0],
        "surfaces": [
            { "position": [0.0, -0.05, 0.0], "size": [1.2, 0.1, 5.0], "material": "grass" }
        ],
        "walls": [
            { "position": [-0.65, 0.1, 0.0], "size": [0.1, 0.3, 5.0] }
        ],
        "obstacles": [
            { "kind": "windmill", "position": [0.0, 0.0, 0.0] }
        ],
        "modifier_spawns": [[0.0, 0.1, 0.0]]
    }"#;

    #[test]
    fn test_hole_deserializes_with_defaults() {
        let hole: Hole = serde_json::from_str(STRAIGHT_HOLE).unwrap();

        assert_eq!(hole.par, 2);
        assert_eq!(hole.tee, DVec3::new(0.0, 0.0, -2.0));
        assert_eq!(hole.surfaces[0].material, SurfaceMaterial::Grass);
        assert_eq!(hole.surfaces[0].rotation, None);
        assert_eq!(hole.walls[0].material, WallMaterial::Wood);
        assert_eq!(hole.obstacles[0].scale, DVec3::ONE);
        assert!(hole.water_hazards.is_empty());
        assert!(hole.out_of_bounds.is_empty());
    }

    #[test]
    fn test_course_total_par() {
        let hole: Hole = serde_json::from_str(STRAIGHT_HOLE).unwrap();
        let course = Course {
            id: "test".to_string(),
            name: "Test".to_string(),
            theme: String::new(),
            description: String::new(),
            holes: vec![hole.clone(), Hole { par: 3, ..hole }],
        };

        assert_eq!(course.hole_count(), 2);
        assert_eq!(course.total_par(), 5);
        assert!(course.hole(2).is_none());
    }
}
