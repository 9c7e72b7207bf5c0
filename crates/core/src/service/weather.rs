use crate::domain::forecast::{aggregate_daily, DailySummary};
use crate::domain::range::{resolve_range, RangeSeries};
use crate::domain::records::{NewWeatherRecord, SnapshotKind, WeatherRecord};
use crate::error::ServiceError;
use crate::provider::ForecastProvider;
use crate::store::RecordStore;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_FORECAST_DAYS: usize = 5;

#[derive(Debug, Serialize)]
pub struct CurrentWeather {
    pub snapshot: Value,
}

#[derive(Debug, Serialize)]
pub struct StoredCurrentWeather {
    pub snapshot: Value,
    pub stored: WeatherRecord,
}

#[derive(Debug, Serialize)]
pub struct ForecastBundle {
    pub raw: Value,
    pub aggregated: Vec<DailySummary>,
}

#[derive(Debug, Serialize)]
pub struct StoredForecastBundle {
    pub raw: Value,
    pub aggregated: Vec<DailySummary>,
    pub stored: WeatherRecord,
}

/// Sequences provider fetches, daily aggregation, and optional persistence.
/// Calls within one request run sequentially (persistence depends on the
/// fetched value) and failures propagate without retry or compensation.
pub struct WeatherService<P, S> {
    provider: P,
    store: S,
}

impl<P: ForecastProvider, S: RecordStore> WeatherService<P, S> {
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub async fn current_only(&self, lat: f64, lng: f64) -> Result<CurrentWeather, ServiceError> {
        let snapshot = self.provider.current(lat, lng).await?;
        Ok(CurrentWeather { snapshot })
    }

    pub async fn current_and_store(
        &self,
        lat: f64,
        lng: f64,
        location_id: Option<i32>,
    ) -> Result<StoredCurrentWeather, ServiceError> {
        let snapshot = self.provider.current(lat, lng).await?;

        let stored = self
            .store
            .save_weather(&NewWeatherRecord {
                location_id,
                lat,
                lng,
                snapshot: snapshot.clone(),
                kind: SnapshotKind::Current,
            })
            .await?;

        Ok(StoredCurrentWeather { snapshot, stored })
    }

    pub async fn forecast_only(
        &self,
        lat: f64,
        lng: f64,
        days: usize,
    ) -> Result<ForecastBundle, ServiceError> {
        let (parsed, raw) = self.provider.forecast(lat, lng).await?;
        let aggregated = aggregate_daily(&parsed, days);
        Ok(ForecastBundle { raw, aggregated })
    }

    pub async fn forecast_and_store(
        &self,
        lat: f64,
        lng: f64,
        days: usize,
        location_id: Option<i32>,
    ) -> Result<StoredForecastBundle, ServiceError> {
        let (parsed, raw) = self.provider.forecast(lat, lng).await?;

        // The raw forecast is persisted as fetched, independent of aggregation.
        let stored = self
            .store
            .save_weather(&NewWeatherRecord {
                location_id,
                lat,
                lng,
                snapshot: raw.clone(),
                kind: SnapshotKind::Forecast,
            })
            .await?;

        let aggregated = aggregate_daily(&parsed, days);
        Ok(StoredForecastBundle {
            raw,
            aggregated,
            stored,
        })
    }

    pub async fn historical_range_only(
        &self,
        lat: f64,
        lng: f64,
        start: &str,
        end: &str,
    ) -> Result<RangeSeries, ServiceError> {
        let (parsed, _raw) = self.provider.forecast(lat, lng).await?;
        resolve_range(&parsed, start, end)
    }
}
