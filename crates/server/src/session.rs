//! Session state: phase, progression counters and the player map.

use std::collections::BTreeMap;

use crate::player::{Player, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Lobby,
    Playing,
    HoleReview,
    CourseEnd,
    TournamentEnd,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::HoleReview => "hole_review",
            Self::CourseEnd => "course_end",
            Self::TournamentEnd => "tournament_end",
        }
    }

    /// Phases from which the host may return the session to the lobby.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CourseEnd | Self::TournamentEnd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchMode {
    #[default]
    Casual,
    Tournament,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Tournament => "tournament",
        }
    }
}

/// Authoritative session record. Mutated only by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub mode: MatchMode,
    pub course_id: String,
    pub hole_index: u32,
    pub countdown_secs: u32,
    /// Position in the tournament course list; 0 for casual matches.
    pub course_index: u32,
    pub total_courses: u32,
    pub host: Option<PlayerId>,
    /// Iterated in id order, which is also join order.
    pub players: BTreeMap<PlayerId, Player>,
}

impl SessionState {
    pub fn participants(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| !p.spectator)
    }

    pub fn participants_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut().filter(|p| !p.spectator)
    }

    pub fn participant_count(&self) -> usize {
        self.participants().count()
    }

    pub fn spectator_count(&self) -> usize {
        self.players.len() - self.participant_count()
    }

    /// True when at least one participant exists and all have finished.
    pub fn all_finished(&self) -> bool {
        let mut participants = self.participants().peekable();
        participants.peek().is_some() && participants.all(|p| p.finished_hole)
    }

    /// True when at least one participant exists and all are ready.
    pub fn all_ready(&self) -> bool {
        let mut participants = self.participants().peekable();
        participants.peek().is_some() && participants.all(|p| p.ready)
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host == Some(player_id)
    }

    /// Lowest-id participant, used when the host role must move.
    pub fn first_participant(&self) -> Option<PlayerId> {
        self.participants().next().map(|p| p.id)
    }

    /// Back to the lobby with match progress cleared. Players are kept.
    pub fn reset_to_lobby(&mut self) {
        self.phase = Phase::Lobby;
        self.mode = MatchMode::Casual;
        self.course_id.clear();
        self.hole_index = 0;
        self.countdown_secs = 0;
        self.course_index = 0;
        self.total_courses = 0;
        for player in self.players.values_mut() {
            player.reset_for_lobby();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Identity;

    fn state_with(players: Vec<Player>) -> SessionState {
        SessionState {
            players: players.into_iter().map(|p| (p.id, p)).collect(),
            ..SessionState::default()
        }
    }

    #[test]
    fn test_all_finished_needs_a_participant() {
        let state = state_with(vec![Player::spectator(1, Identity::named("watcher"))]);
        assert!(!state.all_finished());
        assert!(!state.all_ready());
    }

    #[test]
    fn test_all_finished_ignores_spectators() {
        let mut alice = Player::new(1, Identity::named("alice"), 0);
        alice.finished_hole = true;
        let state = state_with(vec![alice, Player::spectator(2, Identity::named("watcher"))]);

        assert!(state.all_finished());
        assert_eq!(state.participant_count(), 1);
        assert_eq!(state.spectator_count(), 1);
    }

    #[test]
    fn test_first_participant_skips_spectators() {
        let state = state_with(vec![
            Player::spectator(1, Identity::named("watcher")),
            Player::new(4, Identity::named("dave"), 1),
            Player::new(2, Identity::named("bob"), 0),
        ]);
        assert_eq!(state.first_participant(), Some(2));
    }

    #[test]
    fn test_terminal_phases() {
        assert!(Phase::CourseEnd.is_terminal());
        assert!(Phase::TournamentEnd.is_terminal());
        assert!(!Phase::HoleReview.is_terminal());
        assert!(!Phase::Lobby.is_terminal());
    }

    #[test]
    fn test_reset_to_lobby_keeps_players() {
        let mut alice = Player::new(1, Identity::named("alice"), 0);
        alice.total_strokes = 9;
        let mut state = state_with(vec![alice]);
        state.phase = Phase::TournamentEnd;
        state.mode = MatchMode::Tournament;
        state.total_courses = 3;

        state.reset_to_lobby();

        assert_eq!(state.phase, Phase::Lobby);
        assert_eq!(state.mode, MatchMode::Casual);
        assert_eq!(state.total_courses, 0);
        assert_eq!(state.players[&1].total_strokes, 0);
    }
}
