//! Fairway Wire Protocol Types
//!
//! This crate defines the shared Protobuf message types exchanged between
//! game clients and the session server. Both sides MUST depend on this crate
//! so the schema has a single definition.
//!
//! # Message Categories
//!
//! - **Inbound** ([`ClientCommand`]): join, ready toggle, match start, stroke,
//!   modifier use, return to lobby.
//! - **Outbound** ([`ServerMessage`]): welcome, full-state snapshots, the
//!   high-frequency position batch, and discrete notifications.
//!
//! Full-state snapshots and position batches are separate messages so that
//! positions can be sent at network rate without re-sending the player map.
//! Player maps are `btree_map`s so encoding is byte-stable.

#![deny(unsafe_code)]

pub mod diff;

use std::collections::BTreeMap;

use glam::DVec3;
use prost::Message;
use thiserror::Error;

pub use diff::{PlayerField, SessionField, StateChange, diff_snapshots};

// ============================================================================
// Type Aliases
// ============================================================================

/// Participant id on the wire; doubles as the body id.
pub type PlayerId = fairway_sim::BodyId;

/// Pickup id on the wire.
pub type PickupId = u32;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("{0} carries no payload")]
    MissingPayload(&'static str),
}

// ============================================================================
// Shared Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Message)]
pub struct Vec3Proto {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
}

impl From<DVec3> for Vec3Proto {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Proto> for DVec3 {
    fn from(v: Vec3Proto) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PhaseProto {
    Lobby = 0,
    Playing = 1,
    HoleReview = 2,
    CourseEnd = 3,
    TournamentEnd = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ModeProto {
    Casual = 0,
    Tournament = 1,
}

/// Modifier kinds. `Unspecified` is never valid in a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ModifierKindProto {
    Unspecified = 0,
    SteadyAim = 1,
    PowerShot = 2,
    Magnet = 3,
    Rewind = 4,
    GhostBall = 5,
    Teleport = 6,
    SuperSize = 7,
    FunSize = 8,
    IceRink = 9,
    Reversiball = 10,
    TwistedAim = 11,
    Zanyball = 12,
    Steal = 13,
    Fog = 14,
    Earthquake = 15,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCodeProto {
    Unknown = 0,
    CourseNotFound = 1,
    NoCoursesAvailable = 2,
    SessionFull = 3,
}

// ============================================================================
// Inbound Messages
// ============================================================================

/// Display identity supplied on join. Passed through untouched.
#[derive(Clone, PartialEq, Message)]
pub struct Join {
    #[prost(string, tag = "1")]
    pub display_name: String,
    #[prost(string, tag = "2")]
    pub avatar_url: String,
    #[prost(string, tag = "3")]
    pub external_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ToggleReady {}

/// Host request to leave the lobby.
///
/// Casual matches name a course; tournaments give a length (3, 6 or 9).
#[derive(Clone, PartialEq, Message)]
pub struct StartMatch {
    #[prost(enumeration = "ModeProto", tag = "1")]
    pub mode: i32,
    #[prost(string, tag = "2")]
    pub course_id: String,
    #[prost(uint32, tag = "3")]
    pub tournament_length: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Stroke {
    #[prost(double, tag = "1")]
    pub dir_x: f64,
    #[prost(double, tag = "2")]
    pub dir_z: f64,
    /// Expected in `[0, 1]`.
    #[prost(double, tag = "3")]
    pub power: f64,
}

#[derive(Clone, PartialEq, Message)]
pub struct UseModifier {
    #[prost(enumeration = "ModifierKindProto", tag = "1")]
    pub kind: i32,
    #[prost(uint32, optional, tag = "2")]
    pub target_player_id: Option<PlayerId>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReturnToLobby {}

#[derive(Clone, PartialEq, Message)]
pub struct ClientCommand {
    #[prost(oneof = "client_command::Command", tags = "1, 2, 3, 4, 5, 6")]
    pub command: Option<client_command::Command>,
}

pub mod client_command {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Command {
        #[prost(message, tag = "1")]
        Join(super::Join),
        #[prost(message, tag = "2")]
        ToggleReady(super::ToggleReady),
        #[prost(message, tag = "3")]
        StartMatch(super::StartMatch),
        #[prost(message, tag = "4")]
        Stroke(super::Stroke),
        #[prost(message, tag = "5")]
        UseModifier(super::UseModifier),
        #[prost(message, tag = "6")]
        ReturnToLobby(super::ReturnToLobby),
    }
}

impl From<client_command::Command> for ClientCommand {
    fn from(command: client_command::Command) -> Self {
        Self {
            command: Some(command),
        }
    }
}

// ============================================================================
// Full-State Snapshot
// ============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct PlayerSnapshot {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(string, tag = "2")]
    pub display_name: String,
    #[prost(string, tag = "3")]
    pub avatar_url: String,
    #[prost(string, tag = "4")]
    pub external_id: String,
    #[prost(message, optional, tag = "5")]
    pub position: Option<Vec3Proto>,
    #[prost(double, tag = "6")]
    pub ball_radius: f64,
    #[prost(uint32, tag = "7")]
    pub strokes: u32,
    #[prost(uint32, tag = "8")]
    pub total_strokes: u32,
    #[prost(bool, tag = "9")]
    pub finished_hole: bool,
    #[prost(bool, tag = "10")]
    pub ready: bool,
    #[prost(bool, tag = "11")]
    pub spectator: bool,
    #[prost(bool, tag = "12")]
    pub at_rest: bool,
    #[prost(uint32, tag = "13")]
    pub color_index: u32,
    /// Held modifiers in pickup order.
    #[prost(enumeration = "ModifierKindProto", repeated, tag = "14")]
    pub held_modifiers: Vec<i32>,
    /// Active effect flags, ascending.
    #[prost(enumeration = "ModifierKindProto", repeated, tag = "15")]
    pub active_effects: Vec<i32>,
}

impl PlayerSnapshot {
    pub fn position_vec(&self) -> DVec3 {
        self.position.map(DVec3::from).unwrap_or(DVec3::ZERO)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct SessionSnapshot {
    #[prost(enumeration = "PhaseProto", tag = "1")]
    pub phase: i32,
    #[prost(enumeration = "ModeProto", tag = "2")]
    pub mode: i32,
    #[prost(string, tag = "3")]
    pub course_id: String,
    #[prost(uint32, tag = "4")]
    pub hole_index: u32,
    #[prost(uint32, tag = "5")]
    pub countdown_secs: u32,
    #[prost(uint32, tag = "6")]
    pub course_index: u32,
    #[prost(uint32, tag = "7")]
    pub total_courses: u32,
    #[prost(uint32, optional, tag = "8")]
    pub host_id: Option<PlayerId>,
    #[prost(btree_map = "uint32, message", tag = "9")]
    pub players: BTreeMap<PlayerId, PlayerSnapshot>,
}

/// Live body positions, keyed by player id.
#[derive(Clone, PartialEq, Message)]
pub struct PositionBatch {
    #[prost(btree_map = "uint32, message", tag = "1")]
    pub positions: BTreeMap<PlayerId, Vec3Proto>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct Welcome {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(message, optional, tag = "2")]
    pub state: Option<SessionSnapshot>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HoleStart {
    #[prost(uint32, tag = "1")]
    pub hole_index: u32,
    #[prost(uint32, tag = "2")]
    pub par: u32,
    #[prost(message, optional, tag = "3")]
    pub tee: Option<Vec3Proto>,
    #[prost(message, optional, tag = "4")]
    pub target: Option<Vec3Proto>,
}

impl HoleStart {
    pub fn from_hole(hole_index: u32, hole: &fairway_sim::Hole) -> Self {
        Self {
            hole_index,
            par: hole.par,
            tee: Some(hole.tee.into()),
            target: Some(hole.target.into()),
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct HoledOut {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(uint32, tag = "3")]
    pub strokes: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct HoleScoreProto {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(uint32, tag = "3")]
    pub strokes: u32,
    #[prost(uint32, tag = "4")]
    pub total: u32,
    #[prost(sint32, tag = "5")]
    pub vs_par: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CourseScoreProto {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(uint32, tag = "3")]
    pub total: u32,
}

/// Hole leaderboard, ascending by running total.
#[derive(Clone, PartialEq, Message)]
pub struct HoleEnd {
    #[prost(uint32, tag = "1")]
    pub hole_index: u32,
    #[prost(uint32, tag = "2")]
    pub par: u32,
    #[prost(message, repeated, tag = "3")]
    pub scores: Vec<HoleScoreProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CourseEnd {
    #[prost(message, repeated, tag = "1")]
    pub scores: Vec<CourseScoreProto>,
    #[prost(bool, tag = "2")]
    pub tournament: bool,
    #[prost(uint32, tag = "3")]
    pub course_index: u32,
    #[prost(uint32, tag = "4")]
    pub total_courses: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TournamentEnd {
    #[prost(message, repeated, tag = "1")]
    pub scores: Vec<CourseScoreProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SpawnedModifierProto {
    #[prost(uint32, tag = "1")]
    pub pickup_id: PickupId,
    #[prost(enumeration = "ModifierKindProto", tag = "2")]
    pub kind: i32,
    #[prost(message, optional, tag = "3")]
    pub position: Option<Vec3Proto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ModifiersSpawned {
    #[prost(message, repeated, tag = "1")]
    pub pickups: Vec<SpawnedModifierProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ModifierCollected {
    #[prost(uint32, tag = "1")]
    pub pickup_id: PickupId,
    #[prost(uint32, tag = "2")]
    pub player_id: PlayerId,
    #[prost(enumeration = "ModifierKindProto", tag = "3")]
    pub kind: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ModifierUsed {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(enumeration = "ModifierKindProto", tag = "2")]
    pub kind: i32,
    #[prost(uint32, optional, tag = "3")]
    pub target_player_id: Option<PlayerId>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ModifierExpired {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(enumeration = "ModifierKindProto", tag = "2")]
    pub kind: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct PlayerJoined {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
    #[prost(message, optional, tag = "2")]
    pub player: Option<PlayerSnapshot>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PlayerLeft {
    #[prost(uint32, tag = "1")]
    pub player_id: PlayerId,
}

/// Sent only to the connection whose request failed.
#[derive(Clone, PartialEq, Message)]
pub struct CommandError {
    #[prost(enumeration = "ErrorCodeProto", tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ServerMessage {
    #[prost(
        oneof = "server_message::Event",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15"
    )]
    pub event: Option<server_message::Event>,
}

pub mod server_message {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Event {
        #[prost(message, tag = "1")]
        Welcome(super::Welcome),
        #[prost(message, tag = "2")]
        State(super::SessionSnapshot),
        #[prost(message, tag = "3")]
        Positions(super::PositionBatch),
        #[prost(message, tag = "4")]
        HoleStart(super::HoleStart),
        #[prost(message, tag = "5")]
        HoledOut(super::HoledOut),
        #[prost(message, tag = "6")]
        HoleEnd(super::HoleEnd),
        #[prost(message, tag = "7")]
        CourseEnd(super::CourseEnd),
        #[prost(message, tag = "8")]
        TournamentEnd(super::TournamentEnd),
        #[prost(message, tag = "9")]
        ModifiersSpawned(super::ModifiersSpawned),
        #[prost(message, tag = "10")]
        ModifierCollected(super::ModifierCollected),
        #[prost(message, tag = "11")]
        ModifierUsed(super::ModifierUsed),
        #[prost(message, tag = "12")]
        ModifierExpired(super::ModifierExpired),
        #[prost(message, tag = "13")]
        PlayerJoined(super::PlayerJoined),
        #[prost(message, tag = "14")]
        PlayerLeft(super::PlayerLeft),
        #[prost(message, tag = "15")]
        CommandError(super::CommandError),
    }
}

impl From<server_message::Event> for ServerMessage {
    fn from(event: server_message::Event) -> Self {
        Self { event: Some(event) }
    }
}

// ============================================================================
// Framing Helpers
// ============================================================================

pub fn encode_client_command(command: &ClientCommand) -> Vec<u8> {
    command.encode_to_vec()
}

/// Decode a client frame, rejecting frames with no command set.
pub fn decode_client_command(bytes: &[u8]) -> Result<client_command::Command, WireError> {
    ClientCommand::decode(bytes)?
        .command
        .ok_or(WireError::MissingPayload("ClientCommand"))
}

pub fn encode_server_message(message: &ServerMessage) -> Vec<u8> {
    message.encode_to_vec()
}

pub fn decode_server_message(bytes: &[u8]) -> Result<server_message::Event, WireError> {
    ServerMessage::decode(bytes)?
        .event
        .ok_or(WireError::MissingPayload("ServerMessage"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_player(id: PlayerId) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: id,
            display_name: format!("player-{id}"),
            avatar_url: "https://cdn.example/avatar.png".to_string(),
            external_id: format!("ext-{id}"),
            position: Some(Vec3Proto {
                x: 0.123_456_789_012_345,
                y: 0.02,
                z: -1.999_999_999_7,
            }),
            ball_radius: 0.007,
            strokes: 3,
            total_strokes: 11,
            finished_hole: false,
            ready: true,
            spectator: false,
            at_rest: true,
            color_index: 2,
            held_modifiers: vec![ModifierKindProto::Steal as i32, ModifierKindProto::Fog as i32],
            active_effects: vec![ModifierKindProto::FunSize as i32],
        }
    }

    fn sample_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            phase: PhaseProto::Playing as i32,
            mode: ModeProto::Tournament as i32,
            course_id: "windmill-woods".to_string(),
            hole_index: 2,
            countdown_secs: 37,
            course_index: 1,
            total_courses: 3,
            host_id: Some(4),
            players: [(4, sample_player(4)), (9, sample_player(9))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_every_player_field() {
        let original = sample_snapshot();
        let message = ServerMessage::from(server_message::Event::State(original.clone()));

        let bytes = encode_server_message(&message);
        let decoded = decode_server_message(&bytes).unwrap();

        let server_message::Event::State(decoded) = decoded else {
            panic!("expected state event");
        };
        assert_eq!(decoded, original);
        assert_eq!(decoded.phase(), PhaseProto::Playing);
        let player = &decoded.players[&9];
        assert_eq!(player.position_vec().x.to_bits(), 0.123_456_789_012_345f64.to_bits());
        assert_eq!(player.ball_radius, 0.007);
        assert_eq!(
            player.held_modifiers().collect::<Vec<_>>(),
            vec![ModifierKindProto::Steal, ModifierKindProto::Fog]
        );
    }

    #[test]
    fn test_snapshot_encoding_is_stable() {
        let a = sample_snapshot().encode_to_vec();
        let b = sample_snapshot().encode_to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stroke_command_roundtrip() {
        let command = ClientCommand::from(client_command::Command::Stroke(Stroke {
            dir_x: 0.0,
            dir_z: 1.0,
            power: 0.75,
        }));

        let decoded = decode_client_command(&encode_client_command(&command)).unwrap();
        assert_eq!(decoded, command.command.unwrap());
    }

    #[test]
    fn test_use_modifier_target_is_optional() {
        let without = UseModifier {
            kind: ModifierKindProto::Fog as i32,
            target_player_id: None,
        };
        let with = UseModifier {
            kind: ModifierKindProto::Steal as i32,
            target_player_id: Some(0),
        };

        let without = UseModifier::decode(without.encode_to_vec().as_slice()).unwrap();
        let with = UseModifier::decode(with.encode_to_vec().as_slice()).unwrap();

        assert_eq!(without.target_player_id, None);
        assert_eq!(with.target_player_id, Some(0));
        assert_eq!(with.kind(), ModifierKindProto::Steal);
    }

    #[test]
    fn test_empty_frame_is_missing_payload() {
        let err = decode_client_command(&[]).unwrap_err();
        assert!(matches!(err, WireError::MissingPayload("ClientCommand")));

        let err = decode_server_message(&[]).unwrap_err();
        assert!(matches!(err, WireError::MissingPayload("ServerMessage")));
    }

    #[test]
    fn test_garbage_frame_is_decode_error() {
        let err = decode_client_command(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, WireError::Decode(_)));
    }

    #[test]
    fn test_hole_start_from_hole() {
        let hole: fairway_sim::Hole = fairway_sim::Hole {
            id: 3,
            par: 4,
            tee: DVec3::new(0.0, 0.0, -3.0),
            target: DVec3::new(0.0, 0.5, 3.0),
            surfaces: Vec::new(),
            walls: Vec::new(),
            obstacles: Vec::new(),
            modifier_spawns: Vec::new(),
            water_hazards: Vec::new(),
            out_of_bounds: Vec::new(),
        };

        let start = HoleStart::from_hole(2, &hole);

        assert_eq!(start.hole_index, 2);
        assert_eq!(start.par, 4);
        assert_eq!(start.target.map(DVec3::from), Some(hole.target));
    }
}
