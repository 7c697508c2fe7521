// Domain models for the greeting pipeline. No Discord types here; the
// discord layer translates to and from these.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::core::archive::OnThisDayContent;

/// Dev-mode switches. Each one bypasses a single gating rule so local
/// testing is repeatable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevFlags {
    pub always_greet: bool,
    pub always_first: bool,
    pub always_gift: bool,
    pub always_extra_gift: bool,
    pub always_good_to_see_you: bool,
    pub always_weather: bool,
}

/// Tunables for the composition pipeline.
#[derive(Debug, Clone)]
pub struct GreetingOptions {
    /// Days of absence before the reunion clause fires.
    pub good_to_see_you_days: i64,
    pub gift_probability: f64,
    pub extra_gift_probability: f64,
    /// How stale the last greeting must be before re-fetching weather.
    pub weather_freshness_hours: i64,
    pub monday_morning_addendum: Option<String>,
    pub weather_location: Option<String>,
    pub dev: DevFlags,
}

impl Default for GreetingOptions {
    fn default() -> Self {
        Self {
            good_to_see_you_days: 7,
            gift_probability: 0.25,
            extra_gift_probability: 0.25,
            weather_freshness_hours: 6,
            monday_morning_addendum: None,
            weather_location: None,
            dev: DevFlags::default(),
        }
    }
}

/// Everything the composer needs to know about one qualifying join.
#[derive(Debug, Clone)]
pub struct GreetingRequest {
    pub member_id: u64,
    /// Platform mention string for the member ("<@1234>").
    pub member_mention: String,
    /// Members currently on camera in the watched channel, counting the one
    /// who just joined.
    pub occupancy: usize,
    /// Join time in the bot's configured time zone.
    pub now: DateTime<Tz>,
    pub last_seen: Option<DateTime<Utc>>,
    pub latest_greeting: Option<DateTime<Utc>>,
}

impl GreetingRequest {
    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }
}

/// One message-of-the-day body, tagged with its explicit send delay when
/// the entry carried a `delay:` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotdMessage {
    pub body: String,
    pub delay: Option<Duration>,
}

/// What the composer produced for one greeting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreetingPayload {
    pub text: String,
    pub motd_messages: Vec<MotdMessage>,
    pub on_this_day: Option<OnThisDayContent>,
}
