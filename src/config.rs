// Process-wide configuration, read once at startup from the environment.
// A missing or unresolvable setting here is the only fatal error class in
// the whole program; everything after startup degrades and logs instead.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;

use crate::core::greeting::{DevFlags, GreetingOptions};

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub guild_id: Option<u64>,
    pub watch_channel_id: u64,
    pub announce_channel_id: u64,
    pub presence_role_id: Option<u64>,
    pub bot_time_zone: Tz,
    pub typing_delay_ms: u64,
    pub mute_on_join: bool,
    pub data_dir: PathBuf,
    pub port: u16,
    pub greeting: GreetingOptions,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_time_zone: Tz = optional_var("BOT_TIME_ZONE")
            .unwrap_or_else(|| "UTC".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("BOT_TIME_ZONE is not a recognized time zone: {e}"))?;

        let data_dir = match optional_var("DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let greeting = GreetingOptions {
            good_to_see_you_days: parse_or("GOOD_TO_SEE_YOU_DAYS", 7)?,
            gift_probability: parse_or("GIFT_PROBABILITY", 0.25)?,
            extra_gift_probability: parse_or("EXTRA_GIFT_PROBABILITY", 0.25)?,
            weather_freshness_hours: parse_or("WEATHER_FRESHNESS_HOURS", 6)?,
            monday_morning_addendum: optional_var("MONDAY_MORNING_ADDENDUM"),
            weather_location: optional_var("WEATHER_GOV_OFFICE_AND_GRID"),
            dev: parse_dev_flags(&optional_var("DEV_MODE").unwrap_or_default()),
        };

        Ok(Self {
            guild_id: optional_id("GUILD_ID")?,
            watch_channel_id: required_id("WATCH_VOICE_CHANNEL_ID")?,
            announce_channel_id: required_id("ANNOUNCE_CHANNEL_ID")?,
            presence_role_id: optional_id("PRESENCE_ROLE_ID")?,
            bot_time_zone,
            typing_delay_ms: parse_or("TYPING_DELAY_MS", 3000)?,
            mute_on_join: parse_or("MUTE_ON_JOIN", false)?,
            data_dir,
            port: parse_or("PORT", 8080)?,
            greeting,
        })
    }

    /// Delay before the main greeting send. The alwaysGreet dev flag drops
    /// it to zero so local testing is instant.
    pub fn typing_delay(&self) -> Duration {
        if self.greeting.dev.always_greet {
            Duration::ZERO
        } else {
            Duration::from_millis(self.typing_delay_ms)
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("last-seen.json")
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn required_id(name: &str) -> anyhow::Result<u64> {
    let value = std::env::var(name).with_context(|| format!("{name} is required"))?;
    value
        .parse()
        .with_context(|| format!("{name} must be a numeric ID"))
}

fn optional_id(name: &str) -> anyhow::Result<Option<u64>> {
    optional_var(name)
        .map(|value| {
            value
                .parse()
                .with_context(|| format!("{name} must be a numeric ID"))
        })
        .transpose()
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match optional_var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} is invalid: {e}")),
    }
}

/// DEV_MODE is a comma-separated list of flag names.
fn parse_dev_flags(raw: &str) -> DevFlags {
    let mut flags = DevFlags::default();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token {
            "alwaysGreet" => flags.always_greet = true,
            "alwaysFirst" => flags.always_first = true,
            "alwaysGift" => flags.always_gift = true,
            "alwaysExtraGift" => flags.always_extra_gift = true,
            "alwaysGoodToSeeYou" => flags.always_good_to_see_you = true,
            "alwaysWeather" => flags.always_weather = true,
            other => tracing::warn!("unrecognized DEV_MODE flag: {other}"),
        }
    }
    flags
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    // dirs honors XDG_DATA_HOME and falls back to ~/.local/share.
    dirs::data_dir()
        .map(|dir| dir.join("greeter-bot"))
        .context("unable to determine a data directory; set DATA_DIR")
}
