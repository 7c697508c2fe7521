use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;

use crate::core::weather::{
    clean_period_name, decorate_forecast, Forecast, WeatherError, WeatherProvider,
};

/// Client for the weather.gov gridpoint forecast API. It deliberately
/// exposes only the one call the composer needs.
pub struct WeatherGovClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastPeriod {
    name: String,
    #[serde(rename = "startTime")]
    start_time: DateTime<FixedOffset>,
    #[serde(rename = "endTime")]
    end_time: DateTime<FixedOffset>,
    #[serde(rename = "detailedForecast")]
    detailed_forecast: String,
}

impl WeatherGovClient {
    pub fn new() -> Result<Self, WeatherError> {
        let mut headers = HeaderMap::new();
        // weather.gov rejects requests without an identifying agent.
        headers.insert("User-Agent", HeaderValue::from_static("greeter-bot/0.2"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://api.weather.gov".to_string(),
        })
    }
}

/// The API can include periods that have already elapsed, so pick the one
/// whose window covers the current time rather than trusting the first
/// entry.
fn current_period(
    periods: &[ForecastPeriod],
    now: DateTime<Utc>,
) -> Result<&ForecastPeriod, WeatherError> {
    periods
        .iter()
        .find(|period| {
            period.start_time.with_timezone(&Utc) <= now
                && now < period.end_time.with_timezone(&Utc)
        })
        .ok_or(WeatherError::NoCurrentPeriod)
}

#[async_trait]
impl WeatherProvider for WeatherGovClient {
    async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError> {
        let url = format!("{}/gridpoints/{}/forecast", self.base_url, location);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Malformed(e.to_string()))?;
        if body.properties.periods.is_empty() {
            return Err(WeatherError::Malformed(
                "no forecast periods in response".to_string(),
            ));
        }

        let period = current_period(&body.properties.periods, Utc::now())?;
        Ok(Forecast {
            for_segment: clean_period_name(&period.name),
            text: decorate_forecast(&period.detailed_forecast),
        })
    }
}
