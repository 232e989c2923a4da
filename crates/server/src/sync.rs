//! Projection of authoritative state onto the wire types.
//!
//! Everything here reads; nothing mutates the session. Snapshots are copies,
//! so no reference into the session aggregate escapes to the transport.

use fairway_wire::{
    CommandError, CourseEnd, CourseScoreProto, ErrorCodeProto, HoleEnd, HoleScoreProto, HoleStart,
    HoledOut, ModeProto, ModifierCollected, ModifierExpired, ModifierKindProto, ModifierUsed,
    ModifiersSpawned, PhaseProto, PlayerJoined, PlayerLeft, PlayerSnapshot, SessionSnapshot,
    SpawnedModifierProto, TournamentEnd, Vec3Proto, server_message::Event,
};

use crate::error::SessionError;
use crate::modifier::{ModifierEvent, ModifierKind};
use crate::orchestrator::Notification;
use crate::player::Player;
use crate::scoring::{CourseScore, HoleScore};
use crate::session::{MatchMode, Phase, SessionState};

// ============================================================================
// Enumerations
// ============================================================================

impl From<Phase> for PhaseProto {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Lobby => Self::Lobby,
            Phase::Playing => Self::Playing,
            Phase::HoleReview => Self::HoleReview,
            Phase::CourseEnd => Self::CourseEnd,
            Phase::TournamentEnd => Self::TournamentEnd,
        }
    }
}

impl From<MatchMode> for ModeProto {
    fn from(mode: MatchMode) -> Self {
        match mode {
            MatchMode::Casual => Self::Casual,
            MatchMode::Tournament => Self::Tournament,
        }
    }
}

impl From<ModifierKind> for ModifierKindProto {
    fn from(kind: ModifierKind) -> Self {
        match kind {
            ModifierKind::SteadyAim => Self::SteadyAim,
            ModifierKind::PowerShot => Self::PowerShot,
            ModifierKind::Magnet => Self::Magnet,
            ModifierKind::Rewind => Self::Rewind,
            ModifierKind::GhostBall => Self::GhostBall,
            ModifierKind::Teleport => Self::Teleport,
            ModifierKind::SuperSize => Self::SuperSize,
            ModifierKind::FunSize => Self::FunSize,
            ModifierKind::IceRink => Self::IceRink,
            ModifierKind::Reversiball => Self::Reversiball,
            ModifierKind::TwistedAim => Self::TwistedAim,
            ModifierKind::Zanyball => Self::Zanyball,
            ModifierKind::Steal => Self::Steal,
            ModifierKind::Fog => Self::Fog,
            ModifierKind::Earthquake => Self::Earthquake,
        }
    }
}

/// `Unspecified` has no domain counterpart and is handed back as the error.
impl TryFrom<ModifierKindProto> for ModifierKind {
    type Error = ModifierKindProto;

    fn try_from(proto: ModifierKindProto) -> Result<Self, Self::Error> {
        Ok(match proto {
            ModifierKindProto::Unspecified => return Err(proto),
            ModifierKindProto::SteadyAim => Self::SteadyAim,
            ModifierKindProto::PowerShot => Self::PowerShot,
            ModifierKindProto::Magnet => Self::Magnet,
            ModifierKindProto::Rewind => Self::Rewind,
            ModifierKindProto::GhostBall => Self::GhostBall,
            ModifierKindProto::Teleport => Self::Teleport,
            ModifierKindProto::SuperSize => Self::SuperSize,
            ModifierKindProto::FunSize => Self::FunSize,
            ModifierKindProto::IceRink => Self::IceRink,
            ModifierKindProto::Reversiball => Self::Reversiball,
            ModifierKindProto::TwistedAim => Self::TwistedAim,
            ModifierKindProto::Zanyball => Self::Zanyball,
            ModifierKindProto::Steal => Self::Steal,
            ModifierKindProto::Fog => Self::Fog,
            ModifierKindProto::Earthquake => Self::Earthquake,
        })
    }
}

fn kind_code(kind: ModifierKind) -> i32 {
    ModifierKindProto::from(kind) as i32
}

// ============================================================================
// Snapshots
// ============================================================================

pub fn player_snapshot(player: &Player) -> PlayerSnapshot {
    PlayerSnapshot {
        player_id: player.id,
        display_name: player.identity.display_name.clone(),
        avatar_url: player.identity.avatar_url.clone(),
        external_id: player.identity.external_id.clone(),
        position: Some(player.position.into()),
        ball_radius: player.ball_radius,
        strokes: player.strokes,
        total_strokes: player.total_strokes,
        finished_hole: player.finished_hole,
        ready: player.ready,
        spectator: player.spectator,
        at_rest: player.at_rest,
        color_index: player.color_index,
        held_modifiers: player.held.iter().copied().map(kind_code).collect(),
        active_effects: player.effects.active().into_iter().map(kind_code).collect(),
    }
}

pub fn session_snapshot(state: &SessionState) -> SessionSnapshot {
    SessionSnapshot {
        phase: PhaseProto::from(state.phase) as i32,
        mode: ModeProto::from(state.mode) as i32,
        course_id: state.course_id.clone(),
        hole_index: state.hole_index,
        countdown_secs: state.countdown_secs,
        course_index: state.course_index,
        total_courses: state.total_courses,
        host_id: state.host,
        players: state
            .players
            .values()
            .map(|p| (p.id, player_snapshot(p)))
            .collect(),
    }
}

// ============================================================================
// Notifications
// ============================================================================

fn hole_scores(scores: &[HoleScore]) -> Vec<HoleScoreProto> {
    scores
        .iter()
        .map(|s| HoleScoreProto {
            player_id: s.player_id,
            username: s.username.clone(),
            strokes: s.strokes,
            total: s.total,
            vs_par: s.vs_par,
        })
        .collect()
}

fn course_scores(scores: &[CourseScore]) -> Vec<CourseScoreProto> {
    scores
        .iter()
        .map(|s| CourseScoreProto {
            player_id: s.player_id,
            username: s.username.clone(),
            total: s.total,
        })
        .collect()
}

pub fn modifier_event(event: &ModifierEvent) -> Event {
    match event {
        ModifierEvent::Spawned(pickups) => Event::ModifiersSpawned(ModifiersSpawned {
            pickups: pickups
                .iter()
                .map(|p| SpawnedModifierProto {
                    pickup_id: p.id,
                    kind: kind_code(p.kind),
                    position: Some(Vec3Proto::from(p.position)),
                })
                .collect(),
        }),
        ModifierEvent::Collected {
            pickup_id,
            player_id,
            kind,
        } => Event::ModifierCollected(ModifierCollected {
            pickup_id: *pickup_id,
            player_id: *player_id,
            kind: kind_code(*kind),
        }),
        ModifierEvent::Used {
            player_id,
            kind,
            target,
        } => Event::ModifierUsed(ModifierUsed {
            player_id: *player_id,
            kind: kind_code(*kind),
            target_player_id: *target,
        }),
        ModifierEvent::Expired { player_id, kind } => Event::ModifierExpired(ModifierExpired {
            player_id: *player_id,
            kind: kind_code(*kind),
        }),
    }
}

pub fn notification_event(notification: &Notification) -> Event {
    match notification {
        Notification::HoleStarted { hole_index, hole } => {
            Event::HoleStart(HoleStart::from_hole(*hole_index, hole))
        }
        Notification::HoledOut {
            player_id,
            username,
            strokes,
        } => Event::HoledOut(HoledOut {
            player_id: *player_id,
            username: username.clone(),
            strokes: *strokes,
        }),
        Notification::HoleEnded {
            hole_index,
            par,
            scores,
        } => Event::HoleEnd(HoleEnd {
            hole_index: *hole_index,
            par: *par,
            scores: hole_scores(scores),
        }),
        Notification::CourseEnded {
            scores,
            tournament,
            course_index,
            total_courses,
        } => Event::CourseEnd(CourseEnd {
            scores: course_scores(scores),
            tournament: *tournament,
            course_index: *course_index,
            total_courses: *total_courses,
        }),
        Notification::TournamentEnded { scores } => Event::TournamentEnd(TournamentEnd {
            scores: course_scores(scores),
        }),
        Notification::Modifier(event) => modifier_event(event),
        Notification::PlayerJoined(player) => Event::PlayerJoined(PlayerJoined {
            player_id: player.id,
            player: Some(player_snapshot(player)),
        }),
        Notification::PlayerLeft { player_id } => Event::PlayerLeft(PlayerLeft {
            player_id: *player_id,
        }),
    }
}

pub fn command_error(error: &SessionError) -> CommandError {
    let code = match error {
        SessionError::CourseNotFound(_) => ErrorCodeProto::CourseNotFound,
        SessionError::NoCoursesAvailable => ErrorCodeProto::NoCoursesAvailable,
        SessionError::SessionFull => ErrorCodeProto::SessionFull,
    };
    CommandError {
        code: code as i32,
        message: error.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use fairway_sim::DVec3;

    use super::*;
    use crate::player::Identity;

    #[test]
    fn test_modifier_kinds_map_both_ways() {
        for kind in ModifierKind::ALL {
            let proto = ModifierKindProto::from(kind);
            assert_ne!(proto, ModifierKindProto::Unspecified);
            assert_eq!(ModifierKind::try_from(proto), Ok(kind));
        }
        assert!(ModifierKind::try_from(ModifierKindProto::Unspecified).is_err());
    }

    #[test]
    fn test_player_snapshot_copies_every_field() {
        let mut player = Player::new(3, Identity::named("carol"), 2);
        player.position = DVec3::new(0.1, 0.02, -1.5);
        player.strokes = 2;
        player.total_strokes = 7;
        player.held = vec![ModifierKind::Steal, ModifierKind::Fog];
        player.effects.magnet = true;

        let snapshot = player_snapshot(&player);

        assert_eq!(snapshot.player_id, 3);
        assert_eq!(snapshot.display_name, "carol");
        assert_eq!(snapshot.position_vec(), player.position);
        assert_eq!(snapshot.color_index, 2);
        assert_eq!(snapshot.total_strokes, 7);
        assert_eq!(
            snapshot.held_modifiers,
            vec![ModifierKindProto::Steal as i32, ModifierKindProto::Fog as i32]
        );
        assert_eq!(snapshot.active_effects, vec![ModifierKindProto::Magnet as i32]);
    }

    #[test]
    fn test_session_snapshot_keys_players_by_id() {
        let mut state = SessionState::default();
        state.phase = Phase::HoleReview;
        state.host = Some(2);
        for id in [5, 2] {
            state.players.insert(id, Player::new(id, Identity::named("p"), id));
        }

        let snapshot = session_snapshot(&state);

        assert_eq!(snapshot.phase(), PhaseProto::HoleReview);
        assert_eq!(snapshot.host_id, Some(2));
        assert_eq!(snapshot.players.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn test_command_error_codes() {
        let error = command_error(&SessionError::CourseNotFound("moon".to_string()));
        assert_eq!(error.code(), ErrorCodeProto::CourseNotFound);
        assert!(error.message.contains("moon"));
        assert_eq!(
            command_error(&SessionError::SessionFull).code(),
            ErrorCodeProto::SessionFull
        );
    }
}
