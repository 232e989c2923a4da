//! Authoritative player records.

use fairway_sim::{BALL_RADIUS, DVec3};

use crate::modifier::ModifierKind;

/// Participant id, assigned by the session on connect.
pub type PlayerId = fairway_sim::BodyId;

/// Display identity. Opaque to the session; passed through to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub avatar_url: String,
    pub external_id: String,
}

impl Identity {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }
}

/// Flags for currently active modifier effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectFlags {
    pub steady_aim: bool,
    pub power_shot: bool,
    pub magnet: bool,
    pub ghost_ball: bool,
    pub super_size: bool,
    pub fun_size: bool,
    pub ice_rink: bool,
    pub reversiball: bool,
    pub twisted_aim: bool,
    pub zanyball: bool,
    pub fog: bool,
    pub earthquake: bool,
}

impl EffectFlags {
    /// The flag a modifier kind drives, if it has one.
    pub fn flag_mut(&mut self, kind: ModifierKind) -> Option<&mut bool> {
        match kind {
            ModifierKind::SteadyAim => Some(&mut self.steady_aim),
            ModifierKind::PowerShot => Some(&mut self.power_shot),
            ModifierKind::Magnet => Some(&mut self.magnet),
            ModifierKind::GhostBall => Some(&mut self.ghost_ball),
            ModifierKind::SuperSize => Some(&mut self.super_size),
            ModifierKind::FunSize => Some(&mut self.fun_size),
            ModifierKind::IceRink => Some(&mut self.ice_rink),
            ModifierKind::Reversiball => Some(&mut self.reversiball),
            ModifierKind::TwistedAim => Some(&mut self.twisted_aim),
            ModifierKind::Zanyball => Some(&mut self.zanyball),
            ModifierKind::Fog => Some(&mut self.fog),
            ModifierKind::Earthquake => Some(&mut self.earthquake),
            ModifierKind::Rewind | ModifierKind::Teleport | ModifierKind::Steal => None,
        }
    }

    pub fn is_set(&self, kind: ModifierKind) -> bool {
        let mut copy = *self;
        copy.flag_mut(kind).is_some_and(|flag| *flag)
    }

    /// Kinds whose flag is set, in catalogue order.
    pub fn active(&self) -> Vec<ModifierKind> {
        ModifierKind::ALL
            .into_iter()
            .filter(|kind| self.is_set(*kind))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub identity: Identity,
    pub position: DVec3,
    pub ball_radius: f64,
    pub strokes: u32,
    pub total_strokes: u32,
    pub finished_hole: bool,
    pub at_rest: bool,
    pub ready: bool,
    pub spectator: bool,
    pub color_index: u32,
    /// Pickup order; bounded by the session's held capacity.
    pub held: Vec<ModifierKind>,
    pub effects: EffectFlags,
}

impl Player {
    pub fn new(id: PlayerId, identity: Identity, color_index: u32) -> Self {
        Self {
            id,
            identity,
            position: DVec3::ZERO,
            ball_radius: BALL_RADIUS,
            strokes: 0,
            total_strokes: 0,
            finished_hole: false,
            at_rest: true,
            ready: false,
            spectator: false,
            color_index,
            held: Vec::new(),
            effects: EffectFlags::default(),
        }
    }

    pub fn spectator(id: PlayerId, identity: Identity) -> Self {
        Self {
            spectator: true,
            ..Self::new(id, identity, 0)
        }
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    /// Per-hole reset applied at every hole start.
    pub fn reset_for_hole(&mut self) {
        self.strokes = 0;
        self.finished_hole = false;
        self.at_rest = true;
    }

    /// Reset applied when the session returns to the lobby.
    pub fn reset_for_lobby(&mut self) {
        self.reset_for_hole();
        self.total_strokes = 0;
        self.ready = false;
        self.held.clear();
        self.effects = EffectFlags::default();
        self.ball_radius = BALL_RADIUS;
    }

    pub fn holds(&self, kind: ModifierKind) -> bool {
        self.held.contains(&kind)
    }

    /// Remove one held instance of `kind`. Returns false if none was held.
    pub fn take_held(&mut self, kind: ModifierKind) -> bool {
        match self.held.iter().position(|k| *k == kind) {
            Some(index) => {
                self.held.remove(index);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_flagged_kinds_have_flags() {
        let mut flags = EffectFlags::default();
        for kind in ModifierKind::ALL {
            let expected = !matches!(
                kind,
                ModifierKind::Rewind | ModifierKind::Teleport | ModifierKind::Steal
            );
            assert_eq!(flags.flag_mut(kind).is_some(), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_active_lists_set_flags_in_order() {
        let flags = EffectFlags {
            fog: true,
            magnet: true,
            ..EffectFlags::default()
        };
        assert_eq!(flags.active(), vec![ModifierKind::Magnet, ModifierKind::Fog]);
        assert!(flags.is_set(ModifierKind::Fog));
        assert!(!flags.is_set(ModifierKind::Steal));
    }

    #[test]
    fn test_take_held_removes_one_instance() {
        let mut player = Player::new(1, Identity::named("alice"), 0);
        player.held = vec![ModifierKind::Fog, ModifierKind::Fog];

        assert!(player.take_held(ModifierKind::Fog));
        assert_eq!(player.held, vec![ModifierKind::Fog]);
        assert!(!player.take_held(ModifierKind::Steal));
    }

    #[test]
    fn test_lobby_reset_clears_match_state() {
        let mut player = Player::new(1, Identity::named("alice"), 3);
        player.strokes = 4;
        player.total_strokes = 12;
        player.ready = true;
        player.held.push(ModifierKind::Magnet);
        player.effects.super_size = true;
        player.ball_radius = 0.06;

        player.reset_for_lobby();

        assert_eq!(player.total_strokes, 0);
        assert!(!player.ready);
        assert!(player.held.is_empty());
        assert_eq!(player.effects, EffectFlags::default());
        assert_eq!(player.ball_radius, BALL_RADIUS);
        assert_eq!(player.color_index, 3);
    }
}
