use crate::domain::forecast::RawForecast;
use crate::domain::location::ResolvedLocation;
use crate::error::ServiceError;
use serde_json::Value;

pub mod opencage;
pub mod openweather;

// Provider calls share a fixed per-request budget; no retries at this layer.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Weather source: a point-in-time snapshot and a short-range forecast.
/// The forecast comes back both parsed (for aggregation) and raw (for
/// persistence and pass-through).
#[async_trait::async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn current(&self, lat: f64, lng: f64) -> Result<Value, ServiceError>;

    async fn forecast(&self, lat: f64, lng: f64) -> Result<(RawForecast, Value), ServiceError>;
}

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<ResolvedLocation, ServiceError>;
}
