// Drives one qualifying join through the whole decision pipeline: store
// update first (the sighting is recorded even when we refuse to greet),
// then the same-day dedup gate, then composition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::core::archive::MessageArchive;
use crate::core::presence::{PresenceStateStore, PresenceTracker};
use crate::core::weather::WeatherProvider;

use super::composer::{should_greet, GreetingComposer};
use super::models::{GreetingPayload, GreetingRequest};
use super::random::RandomDraws;

pub struct GreetingService<S: PresenceStateStore, W, A> {
    tracker: Arc<PresenceTracker<S>>,
    composer: GreetingComposer<W, A>,
    time_zone: Tz,
}

impl<S, W, A> GreetingService<S, W, A>
where
    S: PresenceStateStore,
    W: WeatherProvider,
    A: MessageArchive,
{
    pub fn new(
        tracker: Arc<PresenceTracker<S>>,
        composer: GreetingComposer<W, A>,
        time_zone: Tz,
    ) -> Self {
        Self {
            tracker,
            composer,
            time_zone,
        }
    }

    /// Handle one join-with-video event. Returns the composed payload, or
    /// `None` when the member was already greeted today.
    pub async fn handle_join(
        &self,
        member_id: u64,
        member_mention: String,
        occupancy: usize,
        now: DateTime<Utc>,
        rng: &mut dyn RandomDraws,
    ) -> Option<GreetingPayload> {
        let seen = self.tracker.record_seen(member_id, now).await;
        let local_now = now.with_timezone(&self.time_zone);

        if !should_greet(seen.member_last_seen, &local_now, &self.composer.options().dev) {
            tracing::info!(member_id, "refusing to greet more than once today");
            return None;
        }

        let request = GreetingRequest {
            member_id,
            member_mention,
            occupancy,
            now: local_now,
            last_seen: seen.member_last_seen,
            latest_greeting: seen.last_greeting,
        };
        Some(self.composer.compose(&request, rng).await)
    }
}
