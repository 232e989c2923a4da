//! Session actors.
//!
//! Each session runs its [`Orchestrator`] on one tokio task. Connections
//! talk to it through a [`SessionHandle`]; everything the session wants
//! delivered comes back on an unbounded channel as [`Dispatch`] values.
//!
//! The task sleeps until either an inbound message arrives or the next job
//! is due, then advances the orchestrator to the elapsed session time and
//! flushes its outbox.

use std::collections::HashMap;
use std::sync::Arc;

use fairway_wire::{ServerMessage, Welcome, client_command, server_message::Event};
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

use crate::catalog::CourseCatalog;
use crate::config::SessionConfig;
use crate::error::{ConfigError, RuntimeError};
use crate::orchestrator::{Orchestrator, Outbound};
use crate::player::PlayerId;
use crate::sync;

// ============================================================================
// Messages
// ============================================================================

/// Input accepted by a session task.
#[derive(Debug)]
pub enum SessionInput {
    /// Reserve a player id for a new connection.
    Connect { reply: oneshot::Sender<PlayerId> },
    /// A raw client frame.
    Frame { player_id: PlayerId, bytes: Vec<u8> },
    /// An already-decoded client command.
    Command {
        player_id: PlayerId,
        command: client_command::Command,
    },
    Disconnect { player_id: PlayerId },
    Shutdown,
}

/// Who should receive a [`Dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    All,
    Player(PlayerId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl From<Outbound> for Dispatch {
    fn from(outbound: Outbound) -> Self {
        let (audience, event) = match outbound {
            Outbound::Welcome {
                player_id,
                snapshot,
            } => (
                Audience::Player(player_id),
                Event::Welcome(Welcome {
                    player_id,
                    state: Some(snapshot),
                }),
            ),
            Outbound::State(snapshot) => (Audience::All, Event::State(snapshot)),
            Outbound::Positions(batch) => (Audience::All, Event::Positions(batch)),
            Outbound::Notify(notification) => {
                (Audience::All, sync::notification_event(&notification))
            }
            Outbound::Rejected { player_id, error } => (
                Audience::Player(player_id),
                Event::CommandError(sync::command_error(&error)),
            ),
        };
        Self {
            audience,
            message: ServerMessage::from(event),
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable sender side of a session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionInput>,
}

impl SessionHandle {
    /// Reserve a player id. The player joins once it sends a join command.
    pub async fn connect(&self) -> Result<PlayerId, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionInput::Connect { reply })?;
        rx.await.map_err(|_| RuntimeError::SessionClosed)
    }

    pub fn send_frame(&self, player_id: PlayerId, bytes: Vec<u8>) -> Result<(), RuntimeError> {
        self.send(SessionInput::Frame { player_id, bytes })
    }

    pub fn send_command(
        &self,
        player_id: PlayerId,
        command: client_command::Command,
    ) -> Result<(), RuntimeError> {
        self.send(SessionInput::Command { player_id, command })
    }

    pub fn disconnect(&self, player_id: PlayerId) -> Result<(), RuntimeError> {
        self.send(SessionInput::Disconnect { player_id })
    }

    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(SessionInput::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, input: SessionInput) -> Result<(), RuntimeError> {
        self.tx.send(input).map_err(|_| RuntimeError::SessionClosed)
    }
}

// ============================================================================
// Session Task
// ============================================================================

/// Start a session on the current tokio runtime.
pub fn spawn_session(
    config: SessionConfig,
    catalog: Arc<dyn CourseCatalog>,
) -> Result<(SessionHandle, mpsc::UnboundedReceiver<Dispatch>), ConfigError> {
    let orchestrator = Orchestrator::new(config, catalog)?;
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_session(orchestrator, in_rx, out_tx));
    Ok((SessionHandle { tx: in_tx }, out_rx))
}

async fn run_session(
    mut orchestrator: Orchestrator,
    mut inbound: mpsc::UnboundedReceiver<SessionInput>,
    outbound: mpsc::UnboundedSender<Dispatch>,
) {
    let epoch = Instant::now();
    info!("session started");

    loop {
        let deadline = orchestrator.next_deadline().map(|due| epoch + due);
        tokio::select! {
            input = inbound.recv() => match input {
                Some(SessionInput::Shutdown) | None => break,
                Some(input) => {
                    orchestrator.observe_time(epoch.elapsed());
                    accept(&mut orchestrator, input);
                }
            },
            _ = wait_for(deadline) => {}
        }

        orchestrator.advance(epoch.elapsed());
        for message in orchestrator.drain_outbound() {
            if outbound.send(Dispatch::from(message)).is_err() {
                error!("dispatch receiver dropped; stopping session");
                return;
            }
        }
    }

    info!("session stopped");
}

fn accept(orchestrator: &mut Orchestrator, input: SessionInput) {
    match input {
        SessionInput::Connect { reply } => {
            let player_id = orchestrator.allocate_player_id();
            if reply.send(player_id).is_err() {
                debug!("connection for player {player_id} went away before its id was sent");
            }
        }
        SessionInput::Frame { player_id, bytes } => {
            orchestrator.submit_frame(player_id, &bytes);
        }
        SessionInput::Command { player_id, command } => {
            orchestrator.submit(player_id, command);
        }
        SessionInput::Disconnect { player_id } => orchestrator.disconnect(player_id),
        SessionInput::Shutdown => {}
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Result of [`SessionRegistry::open`].
#[derive(Debug)]
pub enum OpenedSession {
    Existing(SessionHandle),
    /// The caller owns the dispatch stream of a new session.
    Spawned(SessionHandle, mpsc::UnboundedReceiver<Dispatch>),
}

impl OpenedSession {
    pub fn handle(&self) -> &SessionHandle {
        match self {
            Self::Existing(handle) | Self::Spawned(handle, _) => handle,
        }
    }
}

/// Independent sessions keyed by context (for example a channel id).
pub struct SessionRegistry {
    config: SessionConfig,
    catalog: Arc<dyn CourseCatalog>,
    sessions: HashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig, catalog: Arc<dyn CourseCatalog>) -> Self {
        Self {
            config,
            catalog,
            sessions: HashMap::new(),
        }
    }

    /// The live session for `key`, if any.
    pub fn get(&self, key: &str) -> Option<SessionHandle> {
        self.sessions
            .get(key)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Join the live session for `key`, or start one.
    pub fn open(&mut self, key: &str) -> Result<OpenedSession, ConfigError> {
        if let Some(handle) = self.get(key) {
            return Ok(OpenedSession::Existing(handle));
        }
        let (handle, dispatch) = spawn_session(self.config.clone(), Arc::clone(&self.catalog))?;
        info!("opened session for `{key}`");
        self.sessions.insert(key.to_string(), handle.clone());
        Ok(OpenedSession::Spawned(handle, dispatch))
    }

    /// Stop the session for `key`. Returns false if none was registered.
    pub fn close(&mut self, key: &str) -> bool {
        match self.sessions.remove(key) {
            Some(handle) => {
                // Already stopped is fine.
                let _ = handle.shutdown();
                true
            }
            None => false,
        }
    }

    /// Forget sessions whose task has stopped.
    pub fn prune(&mut self) {
        self.sessions.retain(|_, handle| !handle.is_closed());
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
