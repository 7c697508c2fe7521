// Greeting-history state: who we last saw, and when the last greeting of
// any kind went out. One join event is processed at a time, so the tracker
// is the single writer; persistence is a best-effort snapshot behind it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum PresenceStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable form of the greeting history: one last-seen timestamp per member
/// plus the time of the most recent greeting sent to anyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GreetingState {
    #[serde(default)]
    pub members: HashMap<u64, DateTime<Utc>>,
    #[serde(rename = "lastGreeting", default, skip_serializing_if = "Option::is_none")]
    pub last_greeting: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PresenceStateStore: Send + Sync + 'static {
    async fn load(&self) -> Result<GreetingState, PresenceStoreError>;
    async fn save(&self, state: &GreetingState) -> Result<(), PresenceStoreError>;
}

/// What `record_seen` read before applying its update. The composer reasons
/// about "how long since" with these values, never the just-written ones.
#[derive(Debug, Clone, Copy)]
pub struct SeenBefore {
    pub member_last_seen: Option<DateTime<Utc>>,
    pub last_greeting: Option<DateTime<Utc>>,
}

pub struct PresenceTracker<S: PresenceStateStore> {
    store: Arc<S>,
    state: RwLock<GreetingState>,
}

impl<S: PresenceStateStore> PresenceTracker<S> {
    /// Load state from the store. A missing or unreadable state file is not
    /// fatal: the tracker starts empty and says so in the log.
    pub async fn load(store: Arc<S>) -> Self {
        let state = match store.load().await {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!("unable to read last-seen records, starting empty: {err}");
                GreetingState::default()
            }
        };
        Self {
            store,
            state: RwLock::new(state),
        }
    }

    #[allow(dead_code)] // Exercised by the stores' round-trip tests.
    pub async fn last_seen(&self, member_id: u64) -> Option<DateTime<Utc>> {
        self.state.read().await.members.get(&member_id).copied()
    }

    #[allow(dead_code)]
    pub async fn last_greeting_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_greeting
    }

    /// Record that a member was just seen and move the global greeting clock
    /// forward. Returns the values both fields held before the update, then
    /// kicks off a persist that never blocks the caller. A failed persist is
    /// logged loud; in-memory state stays authoritative for the rest of the
    /// process lifetime, at the known cost that a crash loses the update.
    pub async fn record_seen(&self, member_id: u64, now: DateTime<Utc>) -> SeenBefore {
        let (snapshot, previous) = {
            let mut state = self.state.write().await;
            let previous = SeenBefore {
                member_last_seen: state.members.insert(member_id, now),
                last_greeting: state.last_greeting.replace(now),
            };
            (state.clone(), previous)
        };

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.save(&snapshot).await {
                Ok(()) => tracing::info!(member_id, "updated last-seen record"),
                Err(err) => {
                    tracing::error!(member_id, "unable to persist last-seen update: {err}")
                }
            }
        });

        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory store that records every snapshot it is handed, and can be
    /// told to fail its writes.
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<GreetingState>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl PresenceStateStore for RecordingStore {
        async fn load(&self) -> Result<GreetingState, PresenceStoreError> {
            Err(PresenceStoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no state yet",
            )))
        }

        async fn save(&self, state: &GreetingState) -> Result<(), PresenceStoreError> {
            if self.fail_writes {
                return Err(PresenceStoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "disk says no",
                )));
            }
            self.saved.lock().unwrap().push(state.clone());
            Ok(())
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn load_failure_yields_empty_state() {
        let tracker = PresenceTracker::load(Arc::new(RecordingStore::default())).await;
        assert_eq!(tracker.last_seen(1).await, None);
        assert_eq!(tracker.last_greeting_time().await, None);
    }

    #[tokio::test]
    async fn record_seen_returns_previous_values() {
        let tracker = PresenceTracker::load(Arc::new(RecordingStore::default())).await;

        let first = tracker.record_seen(1, at(9)).await;
        assert_eq!(first.member_last_seen, None);
        assert_eq!(first.last_greeting, None);

        let second = tracker.record_seen(2, at(10)).await;
        assert_eq!(second.member_last_seen, None);
        assert_eq!(second.last_greeting, Some(at(9)));

        let third = tracker.record_seen(1, at(11)).await;
        assert_eq!(third.member_last_seen, Some(at(9)));
        assert_eq!(third.last_greeting, Some(at(10)));

        assert_eq!(tracker.last_seen(1).await, Some(at(11)));
        assert_eq!(tracker.last_greeting_time().await, Some(at(11)));
    }

    #[tokio::test]
    async fn snapshots_are_eventually_persisted() {
        let store = Arc::new(RecordingStore::default());
        let tracker = PresenceTracker::load(Arc::clone(&store)).await;
        tracker.record_seen(1, at(9)).await;

        for _ in 0..100 {
            if !store.saved.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].members.get(&1), Some(&at(9)));
        assert_eq!(saved[0].last_greeting, Some(at(9)));
    }

    #[tokio::test]
    async fn write_failure_leaves_memory_authoritative() {
        let store = Arc::new(RecordingStore {
            saved: Mutex::new(Vec::new()),
            fail_writes: true,
        });
        let tracker = PresenceTracker::load(Arc::clone(&store)).await;
        tracker.record_seen(1, at(9)).await;

        // The failed write must not roll back or poison the in-memory state.
        assert_eq!(tracker.last_seen(1).await, Some(at(9)));
        let next = tracker.record_seen(1, at(12)).await;
        assert_eq!(next.member_last_seen, Some(at(9)));
    }

    #[test]
    fn state_json_shape_round_trips() {
        let mut state = GreetingState::default();
        state.members.insert(42, at(9));
        state.last_greeting = Some(at(9));

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"members\""));
        assert!(json.contains("\"lastGreeting\""));
        assert!(json.contains("\"42\""));

        let back: GreetingState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.members.get(&42), Some(&at(9)));
        assert_eq!(back.last_greeting, Some(at(9)));
    }
}
