//! Field-level diffs between successive session snapshots.
//!
//! Receivers keep the last snapshot they saw and diff each new one against
//! it. Changes are emitted session fields first, then players in id order:
//! departures, arrivals, and finally per-field changes of players present in
//! both snapshots.

use crate::{PlayerId, PlayerSnapshot, SessionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionField {
    Phase,
    Mode,
    CourseId,
    HoleIndex,
    Countdown,
    CourseIndex,
    TotalCourses,
    Host,
}

impl SessionField {
    pub const ALL: [SessionField; 8] = [
        Self::Phase,
        Self::Mode,
        Self::CourseId,
        Self::HoleIndex,
        Self::Countdown,
        Self::CourseIndex,
        Self::TotalCourses,
        Self::Host,
    ];

    fn differs(self, old: &SessionSnapshot, new: &SessionSnapshot) -> bool {
        match self {
            Self::Phase => old.phase != new.phase,
            Self::Mode => old.mode != new.mode,
            Self::CourseId => old.course_id != new.course_id,
            Self::HoleIndex => old.hole_index != new.hole_index,
            Self::Countdown => old.countdown_secs != new.countdown_secs,
            Self::CourseIndex => old.course_index != new.course_index,
            Self::TotalCourses => old.total_courses != new.total_courses,
            Self::Host => old.host_id != new.host_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerField {
    /// Display name, avatar or external id.
    Identity,
    Position,
    BallRadius,
    Strokes,
    TotalStrokes,
    FinishedHole,
    Ready,
    Spectator,
    AtRest,
    ColorIndex,
    HeldModifiers,
    ActiveEffects,
}

impl PlayerField {
    pub const ALL: [PlayerField; 12] = [
        Self::Identity,
        Self::Position,
        Self::BallRadius,
        Self::Strokes,
        Self::TotalStrokes,
        Self::FinishedHole,
        Self::Ready,
        Self::Spectator,
        Self::AtRest,
        Self::ColorIndex,
        Self::HeldModifiers,
        Self::ActiveEffects,
    ];

    fn differs(self, old: &PlayerSnapshot, new: &PlayerSnapshot) -> bool {
        match self {
            Self::Identity => {
                old.display_name != new.display_name
                    || old.avatar_url != new.avatar_url
                    || old.external_id != new.external_id
            }
            Self::Position => old.position != new.position,
            Self::BallRadius => old.ball_radius != new.ball_radius,
            Self::Strokes => old.strokes != new.strokes,
            Self::TotalStrokes => old.total_strokes != new.total_strokes,
            Self::FinishedHole => old.finished_hole != new.finished_hole,
            Self::Ready => old.ready != new.ready,
            Self::Spectator => old.spectator != new.spectator,
            Self::AtRest => old.at_rest != new.at_rest,
            Self::ColorIndex => old.color_index != new.color_index,
            Self::HeldModifiers => old.held_modifiers != new.held_modifiers,
            Self::ActiveEffects => old.active_effects != new.active_effects,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Session(SessionField),
    PlayerJoined(PlayerId),
    /// Carries the last known record of the departed player.
    PlayerLeft(PlayerSnapshot),
    Player {
        player_id: PlayerId,
        field: PlayerField,
    },
}

/// Diff `new` against `old`. With no previous snapshot every session field
/// is reported changed and every player joined.
pub fn diff_snapshots(old: Option<&SessionSnapshot>, new: &SessionSnapshot) -> Vec<StateChange> {
    let Some(old) = old else {
        let mut changes: Vec<StateChange> =
            SessionField::ALL.into_iter().map(StateChange::Session).collect();
        changes.extend(new.players.keys().copied().map(StateChange::PlayerJoined));
        return changes;
    };

    let mut changes: Vec<StateChange> = SessionField::ALL
        .into_iter()
        .filter(|field| field.differs(old, new))
        .map(StateChange::Session)
        .collect();

    for (id, player) in &old.players {
        if !new.players.contains_key(id) {
            changes.push(StateChange::PlayerLeft(player.clone()));
        }
    }

    for id in new.players.keys() {
        if !old.players.contains_key(id) {
            changes.push(StateChange::PlayerJoined(*id));
        }
    }

    for (id, after) in &new.players {
        let Some(before) = old.players.get(id) else {
            continue;
        };
        changes.extend(
            PlayerField::ALL
                .into_iter()
                .filter(|field| field.differs(before, after))
                .map(|field| StateChange::Player {
                    player_id: *id,
                    field,
                }),
        );
    }

    changes
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PhaseProto, Vec3Proto};

    fn player(id: PlayerId) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: id,
            display_name: format!("p{id}"),
            position: Some(Vec3Proto {
                x: 0.0,
                y: 0.05,
                z: -2.0,
            }),
            ball_radius: 0.02,
            at_rest: true,
            ..Default::default()
        }
    }

    fn snapshot(ids: &[PlayerId]) -> SessionSnapshot {
        SessionSnapshot {
            course_id: "windmill-woods".to_string(),
            host_id: ids.first().copied(),
            players: ids.iter().map(|id| (*id, player(*id))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_snapshot_reports_everything() {
        let changes = diff_snapshots(None, &snapshot(&[1, 2]));

        assert_eq!(changes.len(), SessionField::ALL.len() + 2);
        assert_eq!(changes[SessionField::ALL.len()], StateChange::PlayerJoined(1));
    }

    #[test]
    fn test_identical_snapshots_produce_no_changes() {
        let a = snapshot(&[1, 2]);
        assert!(diff_snapshots(Some(&a), &a.clone()).is_empty());
    }

    #[test]
    fn test_session_and_player_field_changes() {
        let old = snapshot(&[1, 2]);
        let mut new = old.clone();
        new.set_phase(PhaseProto::Playing);
        new.countdown_secs = 59;
        let p2 = new.players.get_mut(&2).unwrap();
        p2.strokes = 1;
        p2.at_rest = false;

        let changes = diff_snapshots(Some(&old), &new);

        assert_eq!(
            changes,
            vec![
                StateChange::Session(SessionField::Phase),
                StateChange::Session(SessionField::Countdown),
                StateChange::Player {
                    player_id: 2,
                    field: PlayerField::Strokes
                },
                StateChange::Player {
                    player_id: 2,
                    field: PlayerField::AtRest
                },
            ]
        );
    }

    #[test]
    fn test_join_and_leave_are_reported() {
        let old = snapshot(&[1, 2]);
        let new = snapshot(&[2, 3]);

        let changes = diff_snapshots(Some(&old), &new);

        assert_eq!(changes[0], StateChange::Session(SessionField::Host));
        assert_eq!(changes[1], StateChange::PlayerLeft(player(1)));
        assert_eq!(changes[2], StateChange::PlayerJoined(3));
        assert_eq!(changes.len(), 3);
    }
}
