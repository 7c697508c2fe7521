// Weather support for greetings: the provider port, plus the text cleanup
// applied to whatever forecast comes back. The fetch itself lives in infra.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(String),
    #[error("malformed weather response: {0}")]
    Malformed(String),
    #[error("no forecast period covers the current time")]
    NoCurrentPeriod,
}

/// A short forecast for the period covering "now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    /// Human-readable name of the period ("this afternoon", "Monday").
    pub for_segment: String,
    pub text: String,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError>;
}

struct Condition {
    pattern: Regex,
    emoji: &'static str,
}

// Ordered from more specific phrases to more general ones, so that e.g.
// "partly cloudy" is claimed before the bare "cloudy" rule sees it.
static CONDITIONS: Lazy<Vec<Condition>> = Lazy::new(|| {
    [
        (r"(?i)\bpart(?:ly|ially) sunny\b", ":white_sun_cloud:"),
        (r"(?i)\bpart(?:ly|ially) cloudy\b", ":white_sun_small_cloud:"),
        (r"(?i)\bcloud(?:s|y)?\b", ":cloud:"),
        (r"(?i)\bsun(?:ny)?\b", ":sun_with_face:"),
        (r"(?i)\brain(?:y|fall)?\b|\bshowers\b", ":cloud_with_rain:"),
        (r"(?i)\bsnow(?:y|fall)?\b|\bflurries\b", ":snowflake:"),
        (r"(?i)\bic[ey]\b", ":ice_cube:"),
        (r"(?i)\bthunderstorms?\b|\blightning\b", ":cloud_lightning:"),
    ]
    .into_iter()
    .map(|(pattern, emoji)| Condition {
        pattern: Regex::new(pattern).expect("static condition pattern"),
        emoji,
    })
    .collect()
});

/// Decorate a forecast with emoji matching recognized condition words.
/// Only the first plain occurrence of each condition is decorated; phrases
/// that already carry an emoji and `:shortcode:` tokens are left alone.
pub fn decorate_forecast(forecast: &str) -> String {
    let mut decorated = forecast.to_string();
    for condition in CONDITIONS.iter() {
        let target = decorated.clone();
        for found in condition.pattern.find_iter(&target) {
            if target[..found.start()].ends_with(':') {
                // Inside an emoji shortcode.
                continue;
            }
            if target[found.end()..].starts_with(" :") {
                // Already decorated.
                continue;
            }
            decorated.insert_str(found.end(), &format!(" {}", condition.emoji));
            break;
        }
    }
    decorated
}

static DAY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Mon|Tues|Wednes|Thurs|Fri|Satur|Sun)day$").expect("static day-name pattern")
});

/// Weekday period names keep their capitalization; anything else ("Tonight",
/// "This Afternoon") reads better lowercased mid-sentence.
pub fn clean_period_name(name: &str) -> String {
    if DAY_NAME.is_match(name) {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_emoji_after_weather_conditions() {
        let cases = [
            ("Sunny conditions", "Sunny :sun_with_face: conditions"),
            ("rain", "rain :cloud_with_rain:"),
            ("rainy", "rainy :cloud_with_rain:"),
            ("rainfall", "rainfall :cloud_with_rain:"),
            ("showers", "showers :cloud_with_rain:"),
            ("clouds", "clouds :cloud:"),
            ("cloudy", "cloudy :cloud:"),
            ("Partly sunny", "Partly sunny :white_sun_cloud:"),
            ("partially sunny", "partially sunny :white_sun_cloud:"),
            ("partly cloudy", "partly cloudy :white_sun_small_cloud:"),
            ("partially cloudy", "partially cloudy :white_sun_small_cloud:"),
            ("ice", "ice :ice_cube:"),
            ("icy", "icy :ice_cube:"),
            ("snow", "snow :snowflake:"),
            ("snowfall", "snowfall :snowflake:"),
            ("flurries", "flurries :snowflake:"),
            ("snow flurries", "snow :snowflake: flurries"),
            ("thunderstorm", "thunderstorm :cloud_lightning:"),
            ("thunderstorms", "thunderstorms :cloud_lightning:"),
            ("lightning", "lightning :cloud_lightning:"),
        ];
        for (input, want) in cases {
            assert_eq!(decorate_forecast(input), want, "input: {input}");
        }
    }

    #[test]
    fn does_not_break_up_words() {
        assert_eq!(
            decorate_forecast("expected rainfall is 1 inch"),
            "expected rainfall :cloud_with_rain: is 1 inch"
        );
        assert_eq!(
            decorate_forecast("partly sunny"),
            "partly sunny :white_sun_cloud:"
        );
    }

    #[test]
    fn does_not_affect_already_decorated_phrases() {
        assert_eq!(
            decorate_forecast("Cloudy :cloud: conditions"),
            "Cloudy :cloud: conditions"
        );
    }

    #[test]
    fn does_not_decorate_emoji_names() {
        assert_eq!(decorate_forecast(":sunny:"), ":sunny:");
    }

    #[test]
    fn only_replaces_first_instance() {
        assert_eq!(
            decorate_forecast("Sunny, then cloudy, then sunny again, then cloudy again"),
            "Sunny :sun_with_face:, then cloudy :cloud:, then sunny again, then cloudy again"
        );
    }

    #[test]
    fn capitalizes_period_names_correctly() {
        let cases = [
            ("Monday", "Monday"),
            ("Tuesday", "Tuesday"),
            ("Wednesday", "Wednesday"),
            ("Thursday", "Thursday"),
            ("Friday", "Friday"),
            ("Saturday", "Saturday"),
            ("Sunday", "Sunday"),
            ("Tonight", "tonight"),
            ("Tomorrow", "tomorrow"),
            ("This Afternoon", "this afternoon"),
        ];
        for (input, want) in cases {
            assert_eq!(clean_period_name(input), want, "input: {input}");
        }
    }
}
