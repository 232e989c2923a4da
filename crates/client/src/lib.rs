//! Fairway Client
//!
//! Client-side reconciliation for a Fairway session: a mirror of the
//! authoritative state with change subscriptions, and smoothing for ball
//! positions between network ticks. The client never simulates; everything
//! it shows comes from the server.

#![deny(unsafe_code)]

pub mod interpolation;
pub mod mirror;

pub use interpolation::{BallSmoother, smoothing_factor};
pub use mirror::{ChangeCallback, ChangeFilter, StateMirror, SubscriptionId};

use fairway_wire::{
    PlayerId, ServerMessage, SessionSnapshot, StateChange, WireError, decode_server_message,
    server_message::Event,
};
use glam::DVec3;
use log::debug;

/// Routes server messages into the mirror and the smoother.
#[derive(Default)]
pub struct Reconciler {
    mirror: StateMirror,
    smoother: BallSmoother,
    local_player: Option<PlayerId>,
    /// Set by a hole start; the next state sync teleports every ball.
    snap_next_state: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mirror(&self) -> &StateMirror {
        &self.mirror
    }

    pub fn mirror_mut(&mut self) -> &mut StateMirror {
        &mut self.mirror
    }

    pub fn smoother(&self) -> &BallSmoother {
        &self.smoother
    }

    /// Id assigned by the server's welcome.
    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    /// Rendered position of a ball.
    pub fn ball_position(&self, player_id: PlayerId) -> Option<DVec3> {
        self.smoother.position(player_id)
    }

    /// Decode and route one frame.
    pub fn handle_frame(&mut self, bytes: &[u8]) -> Result<Option<Event>, WireError> {
        let event = decode_server_message(bytes)?;
        Ok(self.handle_event(event))
    }

    /// Route `message`. Events the mirror does not absorb are returned for
    /// the caller to present.
    pub fn handle(&mut self, message: ServerMessage) -> Option<Event> {
        self.handle_event(message.event?)
    }

    fn handle_event(&mut self, event: Event) -> Option<Event> {
        match event {
            Event::Welcome(welcome) => {
                self.local_player = Some(welcome.player_id);
                self.mirror.clear();
                self.smoother.clear();
                if let Some(state) = welcome.state {
                    self.snap_next_state = true;
                    self.apply_state(state);
                }
                None
            }
            Event::State(state) => {
                self.apply_state(state);
                None
            }
            Event::Positions(batch) => {
                for (id, position) in batch.positions {
                    self.smoother.set_target(id, position.into());
                }
                None
            }
            Event::HoleStart(start) => {
                self.snap_next_state = true;
                Some(Event::HoleStart(start))
            }
            Event::PlayerLeft(left) => {
                self.smoother.remove(left.player_id);
                Some(Event::PlayerLeft(left))
            }
            other => Some(other),
        }
    }

    fn apply_state(&mut self, state: SessionSnapshot) {
        let snap = std::mem::take(&mut self.snap_next_state);
        for (id, player) in &state.players {
            if player.spectator {
                continue;
            }
            let just_finished = player.finished_hole
                && !self.mirror.player(*id).is_some_and(|p| p.finished_hole);
            if snap || just_finished {
                self.smoother.snap(*id, player.position_vec());
            } else if self.smoother.position(*id).is_none() {
                self.smoother.set_target(*id, player.position_vec());
            }
        }
        self.smoother.retain(|id| state.players.contains_key(&id));

        let changes = self.mirror.apply(state);
        let departed = changes
            .iter()
            .filter(|change| matches!(change, StateChange::PlayerLeft(_)))
            .count();
        debug!(
            "state sync: {} change(s), {departed} departure(s), snap {snap}",
            changes.len()
        );
    }

    /// Advance position smoothing by a frame of `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        self.smoother.update(dt);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fairway_wire::{
        HoleStart, HoledOut, PlayerSnapshot, PositionBatch, SessionField, Vec3Proto, Welcome,
        encode_server_message,
    };

    use super::*;

    fn player_at(id: PlayerId, position: DVec3) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: id,
            position: Some(position.into()),
            ..PlayerSnapshot::default()
        }
    }

    fn state(players: &[(PlayerId, DVec3)]) -> SessionSnapshot {
        SessionSnapshot {
            players: players
                .iter()
                .map(|&(id, pos)| (id, player_at(id, pos)))
                .collect(),
            ..SessionSnapshot::default()
        }
    }

    fn positions(entries: &[(PlayerId, DVec3)]) -> ServerMessage {
        let positions: BTreeMap<PlayerId, Vec3Proto> =
            entries.iter().map(|&(id, pos)| (id, pos.into())).collect();
        ServerMessage::from(Event::Positions(PositionBatch { positions }))
    }

    fn welcomed(players: &[(PlayerId, DVec3)]) -> Reconciler {
        let mut reconciler = Reconciler::new();
        reconciler.handle(ServerMessage::from(Event::Welcome(Welcome {
            player_id: players[0].0,
            state: Some(state(players)),
        })));
        reconciler
    }

    #[test]
    fn test_welcome_seeds_mirror_and_balls() {
        let reconciler = welcomed(&[(1, DVec3::new(0.0, 0.05, -2.0))]);

        assert_eq!(reconciler.local_player(), Some(1));
        assert!(reconciler.mirror().player(1).is_some());
        assert_eq!(reconciler.ball_position(1), Some(DVec3::new(0.0, 0.05, -2.0)));
    }

    #[test]
    fn test_positions_are_smoothed() {
        let mut reconciler = welcomed(&[(1, DVec3::ZERO)]);

        assert!(reconciler.handle(positions(&[(1, DVec3::Z)])).is_none());
        assert_eq!(reconciler.ball_position(1), Some(DVec3::ZERO));

        reconciler.update(1.0 / 60.0);
        let z = reconciler.ball_position(1).unwrap().z;
        assert!(z > 0.0 && z < 1.0);
    }

    #[test]
    fn test_hole_start_snaps_on_next_state() {
        let mut reconciler = welcomed(&[(1, DVec3::ZERO)]);
        reconciler.handle(positions(&[(1, DVec3::Z)]));

        let start = ServerMessage::from(Event::HoleStart(HoleStart::default()));
        assert!(matches!(reconciler.handle(start), Some(Event::HoleStart(_))));
        reconciler.handle(ServerMessage::from(Event::State(state(&[(1, DVec3::X)]))));

        assert_eq!(reconciler.ball_position(1), Some(DVec3::X));
    }

    #[test]
    fn test_state_without_hole_start_keeps_easing() {
        let mut reconciler = welcomed(&[(1, DVec3::ZERO)]);
        reconciler.handle(positions(&[(1, DVec3::Z)]));

        reconciler.handle(ServerMessage::from(Event::State(state(&[(1, DVec3::X)]))));

        assert_eq!(reconciler.ball_position(1), Some(DVec3::ZERO));
        assert_eq!(reconciler.smoother().target(1), Some(DVec3::Z));
    }

    #[test]
    fn test_finished_ball_snaps_to_reported_position() {
        let mut reconciler = welcomed(&[(1, DVec3::ZERO)]);
        reconciler.handle(positions(&[(1, DVec3::new(0.0, 0.0, 1.9))]));
        reconciler.update(1.0 / 60.0);

        let hidden = DVec3::new(0.0, -10.0, 0.0);
        let mut next = state(&[(1, hidden)]);
        next.players.get_mut(&1).unwrap().finished_hole = true;
        reconciler.handle(ServerMessage::from(Event::State(next.clone())));

        assert_eq!(reconciler.ball_position(1), Some(hidden));
        assert_eq!(reconciler.smoother().target(1), Some(hidden));

        next.players.get_mut(&1).unwrap().position = Some(DVec3::ZERO.into());
        reconciler.handle(ServerMessage::from(Event::State(next)));
        assert_eq!(reconciler.ball_position(1), Some(hidden));
    }

    #[test]
    fn test_departed_players_are_dropped() {
        let mut reconciler = welcomed(&[(1, DVec3::ZERO), (2, DVec3::X)]);

        reconciler.handle(ServerMessage::from(Event::State(state(&[(1, DVec3::ZERO)]))));

        assert!(reconciler.ball_position(2).is_none());
        assert!(reconciler.mirror().player(2).is_none());
    }

    #[test]
    fn test_notifications_pass_through_frames() {
        let mut reconciler = Reconciler::new();
        let holed = ServerMessage::from(Event::HoledOut(HoledOut {
            player_id: 3,
            username: "carol".to_string(),
            strokes: 2,
        }));

        let event = reconciler
            .handle_frame(&encode_server_message(&holed))
            .unwrap();

        assert!(matches!(event, Some(Event::HoledOut(HoledOut { strokes: 2, .. }))));
        assert!(reconciler.handle_frame(&[0xff, 0xff]).is_err());
    }

    #[test]
    fn test_mirror_subscribers_see_state_syncs() {
        let mut reconciler = welcomed(&[(1, DVec3::ZERO)]);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(0));
        let sink = std::sync::Arc::clone(&seen);
        reconciler.mirror_mut().subscribe(
            ChangeFilter::Session(SessionField::Countdown),
            move |_, _| *sink.lock().unwrap() += 1,
        );

        let mut next = state(&[(1, DVec3::ZERO)]);
        next.countdown_secs = 59;
        reconciler.handle(ServerMessage::from(Event::State(next)));

        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
