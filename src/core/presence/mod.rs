pub mod tracker;
pub mod watcher;

pub use tracker::{
    GreetingState, PresenceStateStore, PresenceStoreError, PresenceTracker, SeenBefore,
};
pub use watcher::{classify, PresenceTransition, VoiceSnapshot};
