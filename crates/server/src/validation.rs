//! Inbound command validation.
//!
//! Runs at the session edge, before a command is queued:
//! - Malformed frame or missing payload: DROP
//! - NaN/Inf in stroke direction or power: DROP
//! - Zero-length stroke direction: DROP
//! - Power outside [0, 1]: CLAMP
//! - Unknown modifier kind: DROP
//! - Tournament length not in [`TOURNAMENT_LENGTHS`]: DROP
//! - Display name: trimmed and truncated
//!
//! Phase, host and rest checks are not done here; they depend on session
//! state at the moment the command is applied.

use fairway_wire::{ModeProto, ModifierKindProto, client_command};

use crate::TOURNAMENT_LENGTHS;
use crate::modifier::ModifierKind;
use crate::player::{Identity, PlayerId};

/// Longest display name kept, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRequest {
    Casual { course_id: String },
    Tournament { length: u32 },
}

/// A validated command, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join(Identity),
    ToggleReady,
    StartMatch(MatchRequest),
    Stroke { dir_x: f64, dir_z: f64, power: f64 },
    UseModifier {
        kind: ModifierKind,
        target: Option<PlayerId>,
    },
    ReturnToLobby,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::ToggleReady => "toggle_ready",
            Self::StartMatch(_) => "start_match",
            Self::Stroke { .. } => "stroke",
            Self::UseModifier { .. } => "use_modifier",
            Self::ReturnToLobby => "return_to_lobby",
        }
    }
}

/// Outcome of validating and queueing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandVerdict {
    Accepted,
    /// Accepted with stroke power clamped into [0, 1].
    AcceptedWithClamp,
    DroppedMalformed,
    DroppedMissingPayload,
    DroppedNanInf,
    DroppedZeroDirection,
    DroppedUnknownModifier(i32),
    DroppedInvalidTournamentLength(u32),
    DroppedRateLimit,
    DroppedUnknownPlayer,
}

impl CommandVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedWithClamp)
    }
}

/// Decode and validate a raw client frame.
pub fn validate_frame(bytes: &[u8]) -> Result<(Command, CommandVerdict), CommandVerdict> {
    match fairway_wire::decode_client_command(bytes) {
        Ok(command) => validate_command(command),
        Err(fairway_wire::WireError::MissingPayload(_)) => Err(CommandVerdict::DroppedMissingPayload),
        Err(fairway_wire::WireError::Decode(_)) => Err(CommandVerdict::DroppedMalformed),
    }
}

/// Validate a decoded client command.
pub fn validate_command(
    command: client_command::Command,
) -> Result<(Command, CommandVerdict), CommandVerdict> {
    use client_command::Command as Wire;

    let accepted = |command| Ok((command, CommandVerdict::Accepted));

    match command {
        Wire::Join(join) => accepted(Command::Join(Identity {
            display_name: sanitize_display_name(&join.display_name),
            avatar_url: join.avatar_url,
            external_id: join.external_id,
        })),
        Wire::ToggleReady(_) => accepted(Command::ToggleReady),
        Wire::StartMatch(start) => match start.mode() {
            ModeProto::Casual => accepted(Command::StartMatch(MatchRequest::Casual {
                course_id: start.course_id,
            })),
            ModeProto::Tournament => {
                if !TOURNAMENT_LENGTHS.contains(&start.tournament_length) {
                    return Err(CommandVerdict::DroppedInvalidTournamentLength(
                        start.tournament_length,
                    ));
                }
                accepted(Command::StartMatch(MatchRequest::Tournament {
                    length: start.tournament_length,
                }))
            }
        },
        Wire::Stroke(stroke) => {
            let values = [stroke.dir_x, stroke.dir_z, stroke.power];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(CommandVerdict::DroppedNanInf);
            }
            if stroke.dir_x == 0.0 && stroke.dir_z == 0.0 {
                return Err(CommandVerdict::DroppedZeroDirection);
            }

            let power = stroke.power.clamp(0.0, 1.0);
            let verdict = if power != stroke.power {
                CommandVerdict::AcceptedWithClamp
            } else {
                CommandVerdict::Accepted
            };
            Ok((
                Command::Stroke {
                    dir_x: stroke.dir_x,
                    dir_z: stroke.dir_z,
                    power,
                },
                verdict,
            ))
        }
        Wire::UseModifier(use_modifier) => {
            let kind = ModifierKindProto::try_from(use_modifier.kind)
                .ok()
                .and_then(|proto| ModifierKind::try_from(proto).ok())
                .ok_or(CommandVerdict::DroppedUnknownModifier(use_modifier.kind))?;
            accepted(Command::UseModifier {
                kind,
                target: use_modifier.target_player_id,
            })
        }
        Wire::ReturnToLobby(_) => accepted(Command::ReturnToLobby),
    }
}

fn sanitize_display_name(name: &str) -> String {
    name.trim().chars().take(MAX_DISPLAY_NAME_CHARS).collect()
}

// ============================================================================
// Tests
// ============================================================================
