use crate::config::Settings;
use crate::domain::location::ResolvedLocation;
use crate::domain::records::{LocationRecord, NewWeatherRecord, WeatherRecord};
use crate::error::ServiceError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Persistence seam for the orchestration services. The production impl is
/// the data service over HTTP; tests swap in an in-memory fake.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn save_weather(&self, record: &NewWeatherRecord) -> Result<WeatherRecord, ServiceError>;

    async fn save_location(
        &self,
        location: &ResolvedLocation,
    ) -> Result<LocationRecord, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build record store http client")?;

        Ok(Self {
            http,
            base_url: settings.data_service_url(),
        })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::upstream(format!("record store request failed: {e}")))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            ServiceError::upstream(format!("failed to read record store response: {e}"))
        })?;

        if !status.is_success() {
            return Err(ServiceError::upstream(format!(
                "record store HTTP {status}: {text}"
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            ServiceError::upstream(format!("unexpected record store response shape: {e}"))
        })
    }
}

#[async_trait::async_trait]
impl RecordStore for HttpRecordStore {
    async fn save_weather(&self, record: &NewWeatherRecord) -> Result<WeatherRecord, ServiceError> {
        self.post_json("/api/v1/records/weather", record).await
    }

    async fn save_location(
        &self,
        location: &ResolvedLocation,
    ) -> Result<LocationRecord, ServiceError> {
        self.post_json("/api/v1/records/location", location).await
    }
}
