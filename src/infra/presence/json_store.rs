use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::presence::{GreetingState, PresenceStateStore, PresenceStoreError};

/// Whole-file JSON snapshot of the greeting state. Write volume is a
/// handful of updates a day, so a single overwritten document beats the
/// ceremony of a real database here.
pub struct JsonPresenceStore {
    path: PathBuf,
}

impl JsonPresenceStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl PresenceStateStore for JsonPresenceStore {
    async fn load(&self) -> Result<GreetingState, PresenceStoreError> {
        if !self.path.exists() {
            return Ok(GreetingState::default());
        }
        let text = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn save(&self, state: &GreetingState) -> Result<(), PresenceStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presence::PresenceTracker;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;
    use std::time::Duration;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPresenceStore::new(dir.path().join("last-seen.json"));
        let state = store.load().await.unwrap();
        assert!(state.members.is_empty());
        assert!(state.last_greeting.is_none());
    }

    #[tokio::test]
    async fn state_round_trips_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last-seen.json");

        let mut state = GreetingState::default();
        state.members.insert(1, at(9));
        state.members.insert(2, at(10));
        state.last_greeting = Some(at(10));

        let store = JsonPresenceStore::new(&path);
        store.save(&state).await.unwrap();

        let reloaded = JsonPresenceStore::new(&path).load().await.unwrap();
        assert_eq!(reloaded.members, state.members);
        assert_eq!(reloaded.last_greeting, state.last_greeting);
    }

    #[tokio::test]
    async fn corrupt_file_surfaces_an_error_for_the_tracker_to_absorb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last-seen.json");
        fs::write(&path, "not json at all").await.unwrap();

        let store = JsonPresenceStore::new(&path);
        assert!(store.load().await.is_err());

        // The tracker downgrades that error to an empty starting state.
        let tracker = PresenceTracker::load(Arc::new(JsonPresenceStore::new(&path))).await;
        assert_eq!(tracker.last_seen(1).await, None);
    }

    #[tokio::test]
    async fn record_seen_sequence_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last-seen.json");

        let tracker = PresenceTracker::load(Arc::new(JsonPresenceStore::new(&path))).await;
        // Space the updates out a little so their spawned snapshot writes
        // land in order.
        tracker.record_seen(1, at(9)).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        tracker.record_seen(2, at(10)).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        tracker.record_seen(1, at(11)).await;

        // Persistence is deliberately asynchronous; wait for the final
        // snapshot to land before reloading.
        let mut persisted = false;
        for _ in 0..200 {
            if let Ok(state) = JsonPresenceStore::new(&path).load().await {
                if state.members.get(&1) == Some(&at(11)) && state.members.len() == 2 {
                    persisted = true;
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(persisted, "snapshot never landed on disk");

        let reloaded = PresenceTracker::load(Arc::new(JsonPresenceStore::new(&path))).await;
        assert_eq!(reloaded.last_seen(1).await, Some(at(11)));
        assert_eq!(reloaded.last_seen(2).await, Some(at(10)));
        assert_eq!(reloaded.last_greeting_time().await, Some(at(11)));
    }
}
