//! Error types.
//!
//! Rejected commands are not errors; they surface as
//! [`CommandVerdict`](crate::validation::CommandVerdict)s or simply leave
//! state unchanged. The types here cover failures a caller must act on.

use thiserror::Error;

/// Session-level failures reported to the participant that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("course `{0}` does not exist")]
    CourseNotFound(String),
    #[error("no courses are available for a tournament")]
    NoCoursesAvailable,
    #[error("session is full")]
    SessionFull,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse course data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate course id `{0}`")]
    DuplicateCourse(String),
    #[error("course `{0}` has no holes")]
    EmptyCourse(String),
}

/// The session task has stopped and no longer accepts input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("session has shut down")]
    SessionClosed,
}

/// Failure exchanging an authorization code for a bearer credential.
///
/// Callers distinguish these from other failures so a client can offer a
/// retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("authorization code is empty")]
    EmptyCode,
    #[error("identity provider rejected the code (status {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("identity provider unreachable: {0}")]
    Transport(String),
    #[error("identity provider returned a malformed response: {0}")]
    MalformedResponse(String),
}
