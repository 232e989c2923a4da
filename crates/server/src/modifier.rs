//! Modifier (power-up) subsystem.
//!
//! Pickups spawn at a hole's spawn points, are collected by rolling a ball
//! over them, and are later used from the player's held collection. Each
//! [`ModifierKind`] maps to exactly one [`Effect`]; adding a kind without
//! deciding its effect does not compile.
//!
//! Instantaneous flags stay set until the next stroke consumes them. Timed
//! flags are registered as [`ActiveEffect`]s and cleared by [`ModifierSystem::tick`].

use std::collections::BTreeMap;
use std::time::Duration;

use fairway_sim::{BALL_RADIUS, DVec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::player::{Player, PlayerId};

/// Radius applied by super size.
pub const SUPER_SIZE_RADIUS: f64 = 0.06;

/// Radius applied by fun size.
pub const FUN_SIZE_RADIUS: f64 = 0.007;

pub type PickupId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierKind {
    SteadyAim,
    PowerShot,
    Magnet,
    Rewind,
    GhostBall,
    Teleport,
    SuperSize,
    FunSize,
    IceRink,
    Reversiball,
    TwistedAim,
    Zanyball,
    Steal,
    Fog,
    Earthquake,
}

/// What using a modifier does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Sets a flag on the user until their next stroke.
    InstantSelf,
    /// Sets a flag on the user until it expires.
    TimedSelf(Duration),
    /// Sets a flag on every opponent until their next stroke.
    InstantOpponents,
    /// Sets a flag on every opponent until it expires.
    TimedOpponents(Duration),
    /// Moves one random held modifier from the target to the user.
    Transfer,
    /// Applied by the orchestrator, which owns positions and strokes.
    Positional,
    /// Completed by client-supplied data outside the session core.
    FollowUp,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 15] = [
        Self::SteadyAim,
        Self::PowerShot,
        Self::Magnet,
        Self::Rewind,
        Self::GhostBall,
        Self::Teleport,
        Self::SuperSize,
        Self::FunSize,
        Self::IceRink,
        Self::Reversiball,
        Self::TwistedAim,
        Self::Zanyball,
        Self::Steal,
        Self::Fog,
        Self::Earthquake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SteadyAim => "steady_aim",
            Self::PowerShot => "power_shot",
            Self::Magnet => "magnet",
            Self::Rewind => "rewind",
            Self::GhostBall => "ghost_ball",
            Self::Teleport => "teleport",
            Self::SuperSize => "super_size",
            Self::FunSize => "fun_size",
            Self::IceRink => "ice_rink",
            Self::Reversiball => "reversiball",
            Self::TwistedAim => "twisted_aim",
            Self::Zanyball => "zanyball",
            Self::Steal => "steal",
            Self::Fog => "fog",
            Self::Earthquake => "earthquake",
        }
    }

    pub fn effect(&self) -> Effect {
        let secs = Duration::from_secs;
        match self {
            Self::SteadyAim | Self::PowerShot => Effect::InstantSelf,
            Self::Magnet => Effect::TimedSelf(secs(5)),
            Self::GhostBall => Effect::TimedSelf(secs(3)),
            Self::Rewind => Effect::Positional,
            Self::Teleport => Effect::FollowUp,
            Self::SuperSize | Self::FunSize => Effect::TimedOpponents(secs(10)),
            Self::IceRink | Self::TwistedAim | Self::Fog => Effect::TimedOpponents(secs(8)),
            Self::Zanyball | Self::Earthquake => Effect::TimedOpponents(secs(5)),
            Self::Reversiball => Effect::InstantOpponents,
            Self::Steal => Effect::Transfer,
        }
    }

    pub fn requires_target(&self) -> bool {
        matches!(self.effect(), Effect::Transfer)
    }

    /// Set this kind's flag on `player`, along with any radius change.
    pub fn apply_to(&self, player: &mut Player) {
        if let Some(flag) = player.effects.flag_mut(*self) {
            *flag = true;
        }
        match self {
            Self::SuperSize => player.ball_radius = SUPER_SIZE_RADIUS,
            Self::FunSize => player.ball_radius = FUN_SIZE_RADIUS,
            _ => {}
        }
    }

    /// Clear this kind's flag on `player`, restoring the default radius for
    /// size effects.
    pub fn clear_from(&self, player: &mut Player) {
        if let Some(flag) = player.effects.flag_mut(*self) {
            *flag = false;
        }
        if matches!(self, Self::SuperSize | Self::FunSize) {
            player.ball_radius = BALL_RADIUS;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedPickup {
    pub id: PickupId,
    pub kind: ModifierKind,
    pub position: DVec3,
    pub collected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEffect {
    pub player_id: PlayerId,
    pub kind: ModifierKind,
    pub expires_at: Duration,
}

/// Observer-facing outcomes of the subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierEvent {
    Spawned(Vec<SpawnedPickup>),
    Collected {
        pickup_id: PickupId,
        player_id: PlayerId,
        kind: ModifierKind,
    },
    Used {
        player_id: PlayerId,
        kind: ModifierKind,
        target: Option<PlayerId>,
    },
    Expired {
        player_id: PlayerId,
        kind: ModifierKind,
    },
}

/// Why a `use_modifier` call changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseRejection {
    UnknownPlayer,
    Spectator,
    NotHeld,
    MissingTarget,
    InvalidTarget,
    NothingToSteal,
}

pub struct ModifierSystem {
    pickups: Vec<SpawnedPickup>,
    effects: Vec<ActiveEffect>,
    next_pickup_id: PickupId,
    pickup_radius: f64,
    max_held: usize,
    rng: Pcg64,
}

impl ModifierSystem {
    pub fn new(seed: u64, pickup_radius: f64, max_held: usize) -> Self {
        Self {
            pickups: Vec::new(),
            effects: Vec::new(),
            next_pickup_id: 1,
            pickup_radius,
            max_held,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn pickups(&self) -> &[SpawnedPickup] {
        &self.pickups
    }

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn max_held(&self) -> usize {
        self.max_held
    }

    /// Replace the pickups with one random kind per spawn point.
    pub fn spawn_for_hole(&mut self, spawn_points: &[DVec3]) -> ModifierEvent {
        self.pickups.clear();
        for position in spawn_points {
            let kind = ModifierKind::ALL[self.rng.random_range(0..ModifierKind::ALL.len())];
            self.pickups.push(SpawnedPickup {
                id: self.next_pickup_id,
                kind,
                position: *position,
                collected: false,
            });
            self.next_pickup_id += 1;
        }
        ModifierEvent::Spawned(self.pickups.clone())
    }

    /// Collect at most one uncollected pickup within reach of `(x, z)`.
    pub fn check_pickup(&mut self, player: &mut Player, x: f64, z: f64) -> Option<ModifierEvent> {
        if player.spectator || player.held.len() >= self.max_held {
            return None;
        }

        let radius = self.pickup_radius;
        let pickup = self.pickups.iter_mut().find(|p| {
            if p.collected {
                return false;
            }
            let dx = x - p.position.x;
            let dz = z - p.position.z;
            (dx * dx + dz * dz).sqrt() < radius
        })?;

        pickup.collected = true;
        player.held.push(pickup.kind);
        Some(ModifierEvent::Collected {
            pickup_id: pickup.id,
            player_id: player.id,
            kind: pickup.kind,
        })
    }

    /// Use a held modifier.
    ///
    /// Every precondition is checked before anything is mutated, so a
    /// rejected call leaves players and effects untouched.
    pub fn use_modifier(
        &mut self,
        players: &mut BTreeMap<PlayerId, Player>,
        user_id: PlayerId,
        kind: ModifierKind,
        target: Option<PlayerId>,
        now: Duration,
    ) -> Result<ModifierEvent, UseRejection> {
        let user = players.get(&user_id).ok_or(UseRejection::UnknownPlayer)?;
        if user.spectator {
            return Err(UseRejection::Spectator);
        }
        if !user.holds(kind) {
            return Err(UseRejection::NotHeld);
        }

        let effect = kind.effect();
        if effect == Effect::Transfer {
            let target_id = target.ok_or(UseRejection::MissingTarget)?;
            if target_id == user_id {
                return Err(UseRejection::InvalidTarget);
            }
            let victim = players.get(&target_id).ok_or(UseRejection::InvalidTarget)?;
            if victim.spectator {
                return Err(UseRejection::InvalidTarget);
            }
            if victim.held.is_empty() {
                return Err(UseRejection::NothingToSteal);
            }
        }

        if let Some(user) = players.get_mut(&user_id) {
            user.take_held(kind);
        }

        match effect {
            Effect::InstantSelf => {
                if let Some(user) = players.get_mut(&user_id) {
                    kind.apply_to(user);
                }
            }
            Effect::TimedSelf(duration) => {
                if let Some(user) = players.get_mut(&user_id) {
                    kind.apply_to(user);
                }
                self.register(user_id, kind, now + duration);
            }
            Effect::InstantOpponents => {
                for opponent in opponents_of(players, user_id) {
                    kind.apply_to(opponent);
                }
            }
            Effect::TimedOpponents(duration) => {
                let mut affected = Vec::new();
                for opponent in opponents_of(players, user_id) {
                    kind.apply_to(opponent);
                    affected.push(opponent.id);
                }
                for opponent_id in affected {
                    self.register(opponent_id, kind, now + duration);
                }
            }
            Effect::Transfer => {
                let stolen = target
                    .and_then(|id| players.get_mut(&id))
                    .filter(|victim| !victim.held.is_empty())
                    .map(|victim| {
                        let index = self.rng.random_range(0..victim.held.len());
                        victim.held.remove(index)
                    });
                if let (Some(stolen), Some(user)) = (stolen, players.get_mut(&user_id)) {
                    user.held.push(stolen);
                }
            }
            Effect::Positional | Effect::FollowUp => {}
        }

        Ok(ModifierEvent::Used {
            player_id: user_id,
            kind,
            target,
        })
    }

    /// Clear every effect whose expiry is at or before `now`.
    pub fn tick(&mut self, players: &mut BTreeMap<PlayerId, Player>, now: Duration) -> Vec<ModifierEvent> {
        let (expired, live): (Vec<ActiveEffect>, Vec<ActiveEffect>) =
            self.effects.drain(..).partition(|e| now >= e.expires_at);
        self.effects = live;

        expired
            .into_iter()
            .filter_map(|effect| {
                let player = players.get_mut(&effect.player_id)?;
                effect.kind.clear_from(player);
                Some(ModifierEvent::Expired {
                    player_id: effect.player_id,
                    kind: effect.kind,
                })
            })
            .collect()
    }

    /// Drop timed effects belonging to a departed player.
    pub fn forget_player(&mut self, player_id: PlayerId) {
        self.effects.retain(|e| e.player_id != player_id);
    }

    /// Drop every pickup and timed effect.
    pub fn clear(&mut self) {
        self.pickups.clear();
        self.effects.clear();
    }

    /// Register a timed effect, refreshing the expiry if one is already running.
    fn register(&mut self, player_id: PlayerId, kind: ModifierKind, expires_at: Duration) {
        match self
            .effects
            .iter_mut()
            .find(|e| e.player_id == player_id && e.kind == kind)
        {
            Some(existing) => existing.expires_at = expires_at,
            None => self.effects.push(ActiveEffect {
                player_id,
                kind,
                expires_at,
            }),
        }
    }
}

fn opponents_of(
    players: &mut BTreeMap<PlayerId, Player>,
    user_id: PlayerId,
) -> impl Iterator<Item = &mut Player> {
    players
        .values_mut()
        .filter(move |p| p.id != user_id && !p.spectator)
}

// ============================================================================
// Tests
// ============================================================================
