use crate::config::Settings;
use crate::domain::location::ResolvedLocation;
use crate::error::ServiceError;
use crate::provider::{Geocoder, REQUEST_TIMEOUT_SECS};
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

/// OpenCage forward-geocoding client. Without an API key it answers from a
/// small fixed map of well-known cities.
#[derive(Debug, Clone)]
pub struct OpenCageClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Option<Geometry>,
    formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl OpenCageClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build geocoding http client")?;

        Ok(Self {
            http,
            api_key: settings.geocoding_api_key.clone(),
            base_url: settings
                .geocoding_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn mock_lookup(query: &str) -> Result<ResolvedLocation, ServiceError> {
        let known: &[(&str, f64, f64, &str)] = &[
            ("toronto", 43.6532, -79.3832, "Toronto, ON, Canada"),
            ("paris", 48.8566, 2.3522, "Paris, France"),
            ("new york", 40.7128, -74.0060, "New York, NY, USA"),
        ];

        let lower = query.to_lowercase();
        for (name, lat, lng, display) in known {
            if lower.contains(name) {
                return Ok(ResolvedLocation {
                    query: query.to_string(),
                    lat: *lat,
                    lng: *lng,
                    display_name: Some((*display).to_string()),
                    source: "mock".to_string(),
                });
            }
        }

        Err(ServiceError::NotFound(format!(
            "Location '{query}' not found in mock database"
        )))
    }
}

#[async_trait::async_trait]
impl Geocoder for OpenCageClient {
    async fn geocode(&self, query: &str) -> Result<ResolvedLocation, ServiceError> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::debug!(query, "no GEOCODING_API_KEY; serving mock geocode");
            return Self::mock_lookup(query);
        };

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("key", key),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::upstream(format!("geocoding request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ServiceError::upstream(format!(
                "geocoding provider HTTP {status}: {body}"
            )));
        }

        let parsed: GeocodeResponse = res.json().await.map_err(|e| {
            ServiceError::upstream(format!("failed to parse geocoding response: {e}"))
        })?;

        let Some(top) = parsed.results.into_iter().next() else {
            return Err(ServiceError::NotFound(format!(
                "Location '{query}' could not be found"
            )));
        };

        let coords = top.geometry.and_then(|g| Some((g.lat?, g.lng?)));
        let Some((lat, lng)) = coords else {
            return Err(ServiceError::NotFound(format!(
                "Invalid coordinates returned for '{query}'"
            )));
        };

        Ok(ResolvedLocation {
            query: query.to_string(),
            lat,
            lng,
            display_name: top.formatted,
            source: "opencage".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyless_client() -> OpenCageClient {
        let settings = Settings {
            database_url: None,
            openweather_api_key: None,
            openweather_base_url: None,
            geocoding_api_key: None,
            geocoding_base_url: None,
            data_service_url: None,
            sentry_dsn: None,
        };
        OpenCageClient::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn mock_resolves_known_city_case_insensitively() {
        let loc = keyless_client().geocode("Weather in Toronto").await.unwrap();
        assert_eq!(loc.lat, 43.6532);
        assert_eq!(loc.source, "mock");
        assert_eq!(loc.display_name.as_deref(), Some("Toronto, ON, Canada"));
    }

    #[tokio::test]
    async fn mock_rejects_unknown_city() {
        let err = keyless_client().geocode("Atlantis").await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotFound("Location 'Atlantis' not found in mock database".to_string())
        );
    }
}
