//! Local mirror of the authoritative session state.
//!
//! Each incoming snapshot is diffed against the previous one and the
//! resulting [`StateChange`]s are handed to every subscriber whose
//! [`ChangeFilter`] matches.

use fairway_wire::{
    PlayerField, PlayerId, PlayerSnapshot, SessionField, SessionSnapshot, StateChange,
    diff_snapshots,
};

pub type SubscriptionId = u64;

/// Which changes a subscriber wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFilter {
    Session(SessionField),
    /// `player_id: None` matches the field on every player.
    Player {
        player_id: Option<PlayerId>,
        field: PlayerField,
    },
    Joined,
    Left,
}

impl ChangeFilter {
    pub fn matches(&self, change: &StateChange) -> bool {
        match (self, change) {
            (Self::Session(wanted), StateChange::Session(field)) => wanted == field,
            (
                Self::Player {
                    player_id: wanted_id,
                    field: wanted,
                },
                StateChange::Player { player_id, field },
            ) => wanted == field && wanted_id.is_none_or(|id| id == *player_id),
            (Self::Joined, StateChange::PlayerJoined(_)) => true,
            (Self::Left, StateChange::PlayerLeft(_)) => true,
            _ => false,
        }
    }
}

/// Subscriber callback. Receives the change and the snapshot it produced.
pub type ChangeCallback = Box<dyn FnMut(&StateChange, &SessionSnapshot) + Send>;

struct Subscriber {
    id: SubscriptionId,
    filter: ChangeFilter,
    callback: ChangeCallback,
}

#[derive(Default)]
pub struct StateMirror {
    snapshot: Option<SessionSnapshot>,
    subscribers: Vec<Subscriber>,
    next_id: SubscriptionId,
}

impl StateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last snapshot applied, if any.
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerSnapshot> {
        self.snapshot.as_ref()?.players.get(&player_id)
    }

    /// Replace the mirrored state and notify subscribers of what changed.
    pub fn apply(&mut self, snapshot: SessionSnapshot) -> Vec<StateChange> {
        let changes = diff_snapshots(self.snapshot.as_ref(), &snapshot);
        for change in &changes {
            for subscriber in &mut self.subscribers {
                if subscriber.filter.matches(change) {
                    (subscriber.callback)(change, &snapshot);
                }
            }
        }
        self.snapshot = Some(snapshot);
        changes
    }

    /// Register a callback.
    ///
    /// Session-field and join subscriptions are replayed against the current
    /// snapshot straight away, so late subscribers see the present state.
    pub fn subscribe(
        &mut self,
        filter: ChangeFilter,
        mut callback: impl FnMut(&StateChange, &SessionSnapshot) + Send + 'static,
    ) -> SubscriptionId {
        if let Some(snapshot) = &self.snapshot {
            match filter {
                ChangeFilter::Session(field) => callback(&StateChange::Session(field), snapshot),
                ChangeFilter::Joined => {
                    for id in snapshot.players.keys() {
                        callback(&StateChange::PlayerJoined(*id), snapshot);
                    }
                }
                ChangeFilter::Player { .. } | ChangeFilter::Left => {}
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Forget the mirrored state. Subscriptions stay.
    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use fairway_wire::PhaseProto;

    use super::*;

    fn player(id: PlayerId, strokes: u32) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: id,
            display_name: format!("p{id}"),
            strokes,
            ..PlayerSnapshot::default()
        }
    }

    fn snapshot(players: &[(PlayerId, u32)]) -> SessionSnapshot {
        SessionSnapshot {
            phase: PhaseProto::Playing as i32,
            players: players.iter().map(|&(id, s)| (id, player(id, s))).collect(),
            ..SessionSnapshot::default()
        }
    }

    fn recorder() -> (
        Arc<Mutex<Vec<StateChange>>>,
        impl FnMut(&StateChange, &SessionSnapshot) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |change: &StateChange, _: &SessionSnapshot| {
            sink.lock().unwrap().push(change.clone());
        })
    }

    #[test]
    fn test_player_field_filter_targets_one_player() {
        let mut mirror = StateMirror::new();
        mirror.apply(snapshot(&[(1, 0), (2, 0)]));
        let (seen, callback) = recorder();
        mirror.subscribe(
            ChangeFilter::Player {
                player_id: Some(2),
                field: PlayerField::Strokes,
            },
            callback,
        );

        mirror.apply(snapshot(&[(1, 1), (2, 1)]));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![StateChange::Player {
                player_id: 2,
                field: PlayerField::Strokes
            }]
        );
    }

    #[test]
    fn test_any_player_filter_sees_all() {
        let mut mirror = StateMirror::new();
        mirror.apply(snapshot(&[(1, 0), (2, 0)]));
        let (seen, callback) = recorder();
        mirror.subscribe(
            ChangeFilter::Player {
                player_id: None,
                field: PlayerField::Strokes,
            },
            callback,
        );

        mirror.apply(snapshot(&[(1, 1), (2, 1)]));

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_late_subscribers_get_current_state() {
        let mut mirror = StateMirror::new();
        mirror.apply(snapshot(&[(1, 0), (3, 0)]));

        let (joined, callback) = recorder();
        mirror.subscribe(ChangeFilter::Joined, callback);
        let (phase, callback) = recorder();
        mirror.subscribe(ChangeFilter::Session(SessionField::Phase), callback);

        assert_eq!(
            *joined.lock().unwrap(),
            vec![StateChange::PlayerJoined(1), StateChange::PlayerJoined(3)]
        );
        assert_eq!(
            *phase.lock().unwrap(),
            vec![StateChange::Session(SessionField::Phase)]
        );
    }

    #[test]
    fn test_departures_carry_last_record() {
        let mut mirror = StateMirror::new();
        mirror.apply(snapshot(&[(1, 4), (2, 0)]));
        let (seen, callback) = recorder();
        mirror.subscribe(ChangeFilter::Left, callback);

        mirror.apply(snapshot(&[(2, 0)]));

        assert_eq!(*seen.lock().unwrap(), vec![StateChange::PlayerLeft(player(1, 4))]);
        assert!(mirror.player(1).is_none());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut mirror = StateMirror::new();
        let (seen, callback) = recorder();
        let id = mirror.subscribe(ChangeFilter::Joined, callback);

        assert!(mirror.unsubscribe(id));
        assert!(!mirror.unsubscribe(id));
        mirror.apply(snapshot(&[(1, 0)]));

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(mirror.subscriber_count(), 0);
    }
}
