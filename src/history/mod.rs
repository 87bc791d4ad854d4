//! Per-player rolling conversation history.
//!
//! Each dispatcher owns one `HistoryStore`; histories are never shared across
//! backends. Entries always come in user/assistant pairs, so a player's
//! history is even-length whenever it is non-empty, and trimming evicts the
//! two oldest entries at a time (sliding window, no summarization).

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

// ── Turns ────────────────────────────────────────────────────────

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Lowercase wire spelling, as every protocol serializes it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One immutable turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────

/// Concurrent per-player history table with a bounded window.
///
/// Backed by a sharded map so lookups and updates lock per key, not globally.
/// The append-pair-then-trim sequence for one player runs under that player's
/// entry guard, which keeps the even-length invariant intact even when two
/// calls for the same player race.
#[derive(Debug)]
pub struct HistoryStore {
    turns: DashMap<String, Vec<ConversationTurn>>,
    max_pairs: usize,
}

impl HistoryStore {
    /// Create a store keeping at most `max_pairs` user/assistant pairs per
    /// player.
    pub fn new(max_pairs: usize) -> Self {
        Self {
            turns: DashMap::new(),
            max_pairs,
        }
    }

    /// Clone of a player's current history, oldest turn first. Empty for
    /// players that have never spoken.
    pub fn snapshot(&self, player_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .get(player_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Append one completed user/assistant exchange and trim the oldest
    /// pairs while over the window cap. Returns the resulting entry count.
    ///
    /// Called only after a fully successful reply parse; failure paths leave
    /// history untouched.
    pub fn record_exchange(&self, player_id: &str, message: &str, reply: &str) -> usize {
        let mut entry = self.turns.entry(player_id.to_string()).or_default();
        entry.push(ConversationTurn::user(message));
        entry.push(ConversationTurn::assistant(reply));
        while entry.len() > self.max_pairs * 2 {
            entry.drain(..2);
        }
        entry.len()
    }

    /// Drop one player's history. No-op if the player has none.
    pub fn clear(&self, player_id: &str) {
        self.turns.remove(player_id);
    }

    /// Drop every player's history (shutdown/reload).
    pub fn clear_all(&self) {
        self.turns.clear();
    }

    /// Number of stored turns for a player.
    pub fn len(&self, player_id: &str) -> usize {
        self.turns.get(player_id).map_or(0, |entry| entry.len())
    }

    pub fn is_empty(&self, player_id: &str) -> bool {
        self.len(player_id) == 0
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_spellings() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn snapshot_of_unknown_player_is_empty() {
        let store = HistoryStore::new(10);
        assert!(store.snapshot("nobody").is_empty());
    }

    #[test]
    fn exchange_appends_a_pair_in_order() {
        let store = HistoryStore::new(10);
        store.record_exchange("p1", "hi", "hello");
        let turns = store.snapshot("p1");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ConversationTurn::user("hi"));
        assert_eq!(turns[1], ConversationTurn::assistant("hello"));
    }

    #[test]
    fn window_evicts_oldest_pair_first() {
        let store = HistoryStore::new(2);
        store.record_exchange("p1", "hi", "r1");
        store.record_exchange("p1", "what's up", "r2");
        store.record_exchange("p1", "bye", "r3");

        let turns = store.snapshot("p1");
        assert_eq!(turns.len(), 4);
        assert_eq!(
            turns,
            vec![
                ConversationTurn::user("what's up"),
                ConversationTurn::assistant("r2"),
                ConversationTurn::user("bye"),
                ConversationTurn::assistant("r3"),
            ]
        );
    }

    #[test]
    fn length_is_min_of_two_n_and_two_k() {
        let store = HistoryStore::new(3);
        for n in 1..=8 {
            store.record_exchange("p1", &format!("m{n}"), &format!("r{n}"));
            assert_eq!(store.len("p1"), (2 * n).min(6));
        }
    }

    #[test]
    fn length_stays_even() {
        let store = HistoryStore::new(2);
        for n in 0..5 {
            store.record_exchange("p1", &format!("m{n}"), "r");
            assert_eq!(store.len("p1") % 2, 0);
        }
    }

    #[test]
    fn zero_pair_window_keeps_nothing() {
        let store = HistoryStore::new(0);
        store.record_exchange("p1", "hi", "r1");
        assert!(store.is_empty("p1"));
    }

    #[test]
    fn players_are_independent() {
        let store = HistoryStore::new(2);
        store.record_exchange("p1", "a", "b");
        store.record_exchange("p2", "c", "d");
        assert_eq!(store.len("p1"), 2);
        assert_eq!(store.len("p2"), 2);

        store.clear("p1");
        assert!(store.is_empty("p1"));
        assert_eq!(store.len("p2"), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = HistoryStore::new(2);
        store.clear("ghost");
        store.record_exchange("p1", "a", "b");
        store.clear("p1");
        store.clear("p1");
        assert!(store.is_empty("p1"));
    }

    #[test]
    fn clear_all_drops_every_player() {
        let store = HistoryStore::new(2);
        store.record_exchange("p1", "a", "b");
        store.record_exchange("p2", "c", "d");
        store.clear_all();
        assert!(store.is_empty("p1"));
        assert!(store.is_empty("p2"));
    }

    #[tokio::test]
    async fn concurrent_same_player_updates_keep_invariant() {
        use std::sync::Arc;

        let store = Arc::new(HistoryStore::new(4));
        let mut handles = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_exchange("p1", &format!("m{n}"), &format!("r{n}"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let turns = store.snapshot("p1");
        assert_eq!(turns.len(), 8);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }
}
