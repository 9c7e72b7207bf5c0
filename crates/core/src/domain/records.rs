use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Current,
    Forecast,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Current => "current",
            SnapshotKind::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for persisting a weather snapshot (raw provider JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWeatherRecord {
    pub location_id: Option<i32>,
    pub lat: f64,
    pub lng: f64,
    pub snapshot: Value,
    pub kind: SnapshotKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeatherRecord {
    pub id: i32,
    pub location_id: Option<i32>,
    pub lat: f64,
    pub lng: f64,
    pub snapshot: Value,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationRecord {
    pub id: i32,
    pub query: String,
    pub lat: f64,
    pub lng: f64,
    pub display_name: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationUpdate {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub display_name: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherRecordUpdate {
    pub location_id: Option<i32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub snapshot: Option<Value>,
    pub kind: Option<String>,
}

/// Saved historical-range query with a compact summary instead of the series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRangeRecord {
    pub query: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub start_date: String,
    pub end_date: String,
    pub summary: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RangeRecord {
    pub id: i32,
    pub query: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub start_date: String,
    pub end_date: String,
    pub summary: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeRecordUpdate {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub summary: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(SnapshotKind::Forecast).unwrap(),
            serde_json::json!("forecast")
        );
        assert_eq!(SnapshotKind::Current.as_str(), "current");
    }
}
