//! Queue of inbound messages awaiting the next `advance`.
//!
//! - Entries are applied in arrival order.
//! - Rate limiting: within one physics-tick window of session time, each
//!   participant may queue `ceil(command_rate_limit_per_sec / tick_rate_hz)`
//!   commands. Draining does not reopen the window.
//! - Disconnects bypass the rate limit.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::player::PlayerId;
use crate::validation::{Command, CommandVerdict};

/// Something a connection asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command(Command),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedInput {
    pub player_id: PlayerId,
    pub input: Inbound,
}

#[derive(Debug)]
pub struct CommandQueue {
    entries: VecDeque<QueuedInput>,
    /// Commands queued per participant in the current window.
    window_counts: HashMap<PlayerId, u32>,
    per_window_limit: u32,
    window_length: Duration,
    /// Index of the current window, counted from the session epoch.
    window: u128,
}

impl CommandQueue {
    pub fn new(per_window_limit: u32, window_length: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            window_counts: HashMap::new(),
            per_window_limit: per_window_limit.max(1),
            window_length: window_length.max(Duration::from_nanos(1)),
            window: 0,
        }
    }

    /// Move the rate-limit window to the one containing `now`. Counts reset
    /// only when `now` falls in a later window.
    pub fn roll_window(&mut self, now: Duration) {
        let window = now.as_nanos() / self.window_length.as_nanos();
        if window > self.window {
            self.window = window;
            self.window_counts.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue a validated command, applying the rate limit.
    pub fn push_command(
        &mut self,
        player_id: PlayerId,
        command: Command,
        verdict: CommandVerdict,
    ) -> CommandVerdict {
        let count = self.window_counts.entry(player_id).or_insert(0);
        if *count >= self.per_window_limit {
            return CommandVerdict::DroppedRateLimit;
        }
        *count += 1;

        self.entries.push_back(QueuedInput {
            player_id,
            input: Inbound::Command(command),
        });
        verdict
    }

    pub fn push_disconnect(&mut self, player_id: PlayerId) {
        self.entries.push_back(QueuedInput {
            player_id,
            input: Inbound::Disconnected,
        });
    }

    /// Whether a join from `player_id` is waiting to be applied.
    pub fn has_pending_join(&self, player_id: PlayerId) -> bool {
        self.entries.iter().any(|q| {
            q.player_id == player_id && matches!(q.input, Inbound::Command(Command::Join(_)))
        })
    }

    /// Take every queued entry in arrival order.
    pub fn drain(&mut self) -> Vec<QueuedInput> {
        self.entries.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.window_counts.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(16);

    #[test]
    fn test_entries_drain_in_arrival_order() {
        let mut queue = CommandQueue::new(4, WINDOW);
        queue.push_command(2, Command::ToggleReady, CommandVerdict::Accepted);
        queue.push_disconnect(1);
        queue.push_command(3, Command::ReturnToLobby, CommandVerdict::Accepted);

        let drained = queue.drain();

        let ids: Vec<PlayerId> = drained.iter().map(|q| q.player_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(drained[1].input, Inbound::Disconnected);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rate_limit_per_window() {
        let mut queue = CommandQueue::new(2, WINDOW);

        assert!(queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted).is_accepted());
        assert!(queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted).is_accepted());
        assert_eq!(
            queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted),
            CommandVerdict::DroppedRateLimit
        );
        assert!(queue.push_command(2, Command::ToggleReady, CommandVerdict::Accepted).is_accepted());

        queue.roll_window(WINDOW);
        assert!(queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted).is_accepted());
    }

    #[test]
    fn test_drain_keeps_window_counts() {
        let mut queue = CommandQueue::new(1, WINDOW);
        queue.roll_window(Duration::from_millis(3));
        queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted);

        queue.drain();
        queue.roll_window(Duration::from_millis(9));

        assert_eq!(
            queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted),
            CommandVerdict::DroppedRateLimit
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stale_time_does_not_reopen_window() {
        let mut queue = CommandQueue::new(1, WINDOW);
        queue.roll_window(WINDOW * 3);
        queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted);

        queue.roll_window(WINDOW);

        assert_eq!(
            queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted),
            CommandVerdict::DroppedRateLimit
        );
    }

    #[test]
    fn test_disconnect_ignores_rate_limit() {
        let mut queue = CommandQueue::new(1, WINDOW);
        queue.push_command(1, Command::ToggleReady, CommandVerdict::Accepted);
        queue.push_disconnect(1);

        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_pending_join_is_visible_until_drain() {
        let mut queue = CommandQueue::new(2, WINDOW);
        queue.push_command(
            7,
            Command::Join(crate::player::Identity::named("g")),
            CommandVerdict::Accepted,
        );

        assert!(queue.has_pending_join(7));
        assert!(!queue.has_pending_join(8));
        queue.drain();
        assert!(!queue.has_pending_join(7));
    }

    #[test]
    fn test_clamp_verdict_is_passed_through() {
        let mut queue = CommandQueue::new(1, WINDOW);
        let command = Command::Stroke {
            dir_x: 1.0,
            dir_z: 0.0,
            power: 1.0,
        };
        assert_eq!(
            queue.push_command(1, command, CommandVerdict::AcceptedWithClamp),
            CommandVerdict::AcceptedWithClamp
        );
    }
}
