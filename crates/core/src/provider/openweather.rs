use crate::config::Settings;
use crate::domain::forecast::RawForecast;
use crate::error::ServiceError;
use crate::provider::{ForecastProvider, REQUEST_TIMEOUT_SECS};
use anyhow::Context;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeather client. Without an API key it serves deterministic development
/// mocks so the rest of the stack can be exercised offline.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build weather provider http client")?;

        Ok(Self {
            http,
            api_key: settings.openweather_api_key.clone(),
            base_url: settings
                .openweather_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn get_json(&self, path: &str, lat: f64, lng: f64) -> Result<Value, ServiceError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let key = self.api_key.as_deref().unwrap_or_default();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("appid", key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::upstream(format!("weather provider request failed: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ServiceError::upstream(format!("failed to read weather provider response: {e}"))
        })?;

        if !status.is_success() {
            return Err(ServiceError::upstream(format!(
                "weather provider HTTP {status}: {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|_| {
            ServiceError::upstream("weather provider returned a non-JSON payload".to_string())
        })
    }

    fn mock_current() -> Value {
        json!({
            "temp": 20.5,
            "feels_like": 20.0,
            "humidity": 60,
            "wind_speed": 3.4,
            "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}],
            "source": "mock"
        })
    }

    fn mock_forecast() -> Value {
        json!({
            "daily": [
                {"dt": 0, "temp": {"min": 10, "max": 20}, "weather": [{"main": "Clear", "description": "clear sky"}]},
                {"dt": 1, "temp": {"min": 11, "max": 21}, "weather": [{"main": "Clouds", "description": "few clouds"}]}
            ],
            "source": "mock"
        })
    }
}

#[async_trait::async_trait]
impl ForecastProvider for OpenWeatherClient {
    async fn current(&self, lat: f64, lng: f64) -> Result<Value, ServiceError> {
        if self.api_key.is_none() {
            tracing::debug!(lat, lng, "no OPENWEATHER_API_KEY; serving mock current weather");
            return Ok(Self::mock_current());
        }
        self.get_json("/weather", lat, lng).await
    }

    async fn forecast(&self, lat: f64, lng: f64) -> Result<(RawForecast, Value), ServiceError> {
        let raw = if self.api_key.is_none() {
            tracing::debug!(lat, lng, "no OPENWEATHER_API_KEY; serving mock forecast");
            Self::mock_forecast()
        } else {
            self.get_json("/forecast", lat, lng).await?
        };

        let parsed = RawForecast::parse(&raw);
        Ok((parsed, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::{aggregate_daily, DayLabel};

    fn keyless_client() -> OpenWeatherClient {
        let settings = Settings {
            database_url: None,
            openweather_api_key: None,
            openweather_base_url: None,
            geocoding_api_key: None,
            geocoding_base_url: None,
            data_service_url: None,
            sentry_dsn: None,
        };
        OpenWeatherClient::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn mock_current_is_served_without_key() {
        let snapshot = keyless_client().current(43.65, -79.38).await.unwrap();
        assert_eq!(snapshot["source"], "mock");
        assert_eq!(snapshot["weather"][0]["description"], "clear sky");
    }

    #[tokio::test]
    async fn mock_forecast_parses_as_bucketed() {
        let (parsed, raw) = keyless_client().forecast(43.65, -79.38).await.unwrap();
        assert_eq!(raw["source"], "mock");

        let days = aggregate_daily(&parsed, 5);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, Some(DayLabel::Epoch(0)));
        assert_eq!(days[0].min_temp, Some(10.0));
        assert_eq!(days[1].summary.as_deref(), Some("few clouds"));
    }
}
