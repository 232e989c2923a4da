//! Leaderboards and per-hole score history.

use std::collections::BTreeMap;

use crate::player::{Player, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleScore {
    pub player_id: PlayerId,
    pub username: String,
    pub strokes: u32,
    pub total: u32,
    pub vs_par: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseScore {
    pub player_id: PlayerId,
    pub username: String,
    pub total: u32,
}

/// Hole leaderboard over the non-spectators, ascending by running total.
///
/// The sort is stable, so ties keep the iteration order of `players`.
pub fn hole_leaderboard<'a>(players: impl IntoIterator<Item = &'a Player>, par: u32) -> Vec<HoleScore> {
    let mut scores: Vec<HoleScore> = players
        .into_iter()
        .filter(|p| !p.spectator)
        .map(|p| HoleScore {
            player_id: p.id,
            username: p.display_name().to_string(),
            strokes: p.strokes,
            total: p.total_strokes,
            vs_par: vs_par(p.strokes, par),
        })
        .collect();
    scores.sort_by_key(|s| s.total);
    scores
}

/// Course or tournament leaderboard, ascending by running total.
pub fn course_leaderboard<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<CourseScore> {
    let mut scores: Vec<CourseScore> = players
        .into_iter()
        .filter(|p| !p.spectator)
        .map(|p| CourseScore {
            player_id: p.id,
            username: p.display_name().to_string(),
            total: p.total_strokes,
        })
        .collect();
    scores.sort_by_key(|s| s.total);
    scores
}

fn vs_par(strokes: u32, par: u32) -> i32 {
    i32::try_from(strokes).unwrap_or(i32::MAX) - i32::try_from(par).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleRecord {
    pub par: u32,
    pub strokes: u32,
}

/// Per-player stroke history for the current match.
#[derive(Debug, Clone, Default)]
pub struct ScoreCard {
    holes: BTreeMap<PlayerId, Vec<HoleRecord>>,
}

impl ScoreCard {
    pub fn record(&mut self, player_id: PlayerId, par: u32, strokes: u32) {
        self.holes
            .entry(player_id)
            .or_default()
            .push(HoleRecord { par, strokes });
    }

    pub fn history(&self, player_id: PlayerId) -> &[HoleRecord] {
        self.holes.get(&player_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self, player_id: PlayerId) -> u32 {
        self.history(player_id).iter().map(|h| h.strokes).sum()
    }

    /// Strokes relative to par over every recorded hole.
    pub fn vs_par(&self, player_id: PlayerId) -> i32 {
        self.history(player_id)
            .iter()
            .map(|h| vs_par(h.strokes, h.par))
            .sum()
    }

    pub fn forget(&mut self, player_id: PlayerId) {
        self.holes.remove(&player_id);
    }

    pub fn clear(&mut self) {
        self.holes.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
