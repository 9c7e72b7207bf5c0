use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Provider forecasts arrive in exactly one of two shapes: a pre-bucketed
/// daily list (One Call style, also used by the development mock) or a flat
/// 3-hour interval list (the standard 5-day forecast endpoint). Detection is
/// structural: the bucketed shape carries a `daily` array, the interval shape
/// a `list` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawForecast {
    Bucketed {
        daily: Vec<BucketedDay>,
    },
    Interval {
        #[serde(default)]
        list: Vec<IntervalEntry>,
    },
}

impl RawForecast {
    /// Lenient parse of an opaque provider payload. Anything matching neither
    /// shape aggregates to an empty series instead of failing the request.
    pub fn parse(raw: &Value) -> Self {
        serde_json::from_value(raw.clone()).unwrap_or(RawForecast::Interval { list: Vec::new() })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketedDay {
    pub dt: Option<DayLabel>,
    #[serde(default)]
    pub temp: TempBounds,
    #[serde(default)]
    pub weather: Vec<WeatherTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TempBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntervalEntry {
    /// Epoch seconds, UTC. Entries without one are skipped during grouping.
    pub dt: Option<i64>,
    pub main: Option<PointReadings>,
    #[serde(default)]
    pub weather: Vec<WeatherTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointReadings {
    pub temp: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherTag {
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// The bucketed shape passes its day identifier through unreformatted, so a
/// mock day keeps its epoch while a grouped interval day is always an ISO
/// date string. Worth normalizing eventually, but callers depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayLabel {
    Epoch(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: Option<DayLabel>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub summary: Option<String>,
    pub icon: Option<String>,
}

/// Reduce a raw forecast to at most `max_days` per-day summaries, ascending
/// by date, one entry per calendar date. Pure and deterministic.
pub fn aggregate_daily(raw: &RawForecast, max_days: usize) -> Vec<DailySummary> {
    match raw {
        RawForecast::Bucketed { daily } => daily
            .iter()
            .take(max_days)
            .map(summarize_bucketed_day)
            .collect(),
        RawForecast::Interval { list } => aggregate_intervals(list, max_days),
    }
}

fn summarize_bucketed_day(day: &BucketedDay) -> DailySummary {
    let tag = day.weather.first();
    DailySummary {
        date: day.dt.clone(),
        min_temp: day.temp.min,
        max_temp: day.temp.max,
        summary: tag.and_then(|w| w.description.clone()),
        icon: tag.and_then(|w| w.icon.clone()),
    }
}

fn aggregate_intervals(list: &[IntervalEntry], max_days: usize) -> Vec<DailySummary> {
    // BTreeMap keys sort ascending, which is chronological for ISO dates.
    let mut buckets: BTreeMap<String, Vec<&IntervalEntry>> = BTreeMap::new();
    for entry in list {
        let Some(epoch) = entry.dt else { continue };
        let Some(ts) = DateTime::from_timestamp(epoch, 0) else { continue };
        buckets
            .entry(ts.date_naive().to_string())
            .or_default()
            .push(entry);
    }

    buckets
        .into_iter()
        .take(max_days)
        .map(|(date, entries)| summarize_interval_day(date, &entries))
        .collect()
}

fn summarize_interval_day(date: String, entries: &[&IntervalEntry]) -> DailySummary {
    let readings = |pick: fn(&PointReadings) -> Option<f64>| -> Vec<f64> {
        entries
            .iter()
            .filter_map(|e| e.main.as_ref().and_then(pick))
            .collect()
    };

    let mins = readings(|m| m.temp_min);
    let maxs = readings(|m| m.temp_max);
    let temps = readings(|m| m.temp);

    // Prefer explicit bounds; fall back to point temps; absent stays absent.
    let min_temp = fold(&mins, f64::min).or_else(|| fold(&temps, f64::min));
    let max_temp = fold(&maxs, f64::max).or_else(|| fold(&temps, f64::max));

    // Representative descriptor: first entry, in original order, whose leading
    // weather tag has a non-empty description.
    let descriptor = entries.iter().find_map(|e| {
        let tag = e.weather.first()?;
        tag.description
            .as_deref()
            .is_some_and(|d| !d.is_empty())
            .then(|| tag.clone())
    });

    DailySummary {
        date: Some(DayLabel::Text(date)),
        min_temp,
        max_temp,
        summary: descriptor.as_ref().and_then(|w| w.description.clone()),
        icon: descriptor.and_then(|w| w.icon),
    }
}

fn fold(values: &[f64], pick: fn(f64, f64) -> f64) -> Option<f64> {
    values.iter().copied().reduce(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interval_fixture() -> RawForecast {
        // Two entries on 2024-01-01 (03:00Z and 15:00Z) and one on 2024-01-02.
        RawForecast::parse(&json!({
            "list": [
                {
                    "dt": 1_704_078_000i64,
                    "main": {"temp": 12.0, "temp_min": 10.0, "temp_max": 15.0},
                    "weather": [{"main": "Clear", "description": "clear", "icon": "01d"}]
                },
                {
                    "dt": 1_704_121_200i64,
                    "main": {"temp": 14.0, "temp_min": 8.0, "temp_max": 18.0},
                    "weather": [{"main": "Clouds", "description": "", "icon": "03d"}]
                },
                {
                    "dt": 1_704_164_400i64,
                    "main": {"temp": 9.0, "temp_min": 7.0, "temp_max": 11.0},
                    "weather": [{"main": "Rain", "description": "light rain", "icon": "10d"}]
                }
            ]
        }))
    }

    #[test]
    fn detects_bucketed_shape_structurally() {
        let raw = RawForecast::parse(&json!({"daily": [], "source": "mock"}));
        assert!(matches!(raw, RawForecast::Bucketed { .. }));
    }

    #[test]
    fn detects_interval_shape_structurally() {
        let raw = RawForecast::parse(&json!({"list": [], "cod": "200"}));
        assert!(matches!(raw, RawForecast::Interval { .. }));
    }

    #[test]
    fn payload_without_either_field_aggregates_to_empty() {
        let raw = RawForecast::parse(&json!({"temp": 20.5, "source": "mock"}));
        assert!(aggregate_daily(&raw, 5).is_empty());
    }

    #[test]
    fn groups_intervals_by_utc_date() {
        let days = aggregate_daily(&interval_fixture(), 5);
        assert_eq!(days.len(), 2);
        assert_eq!(
            days[0].date,
            Some(DayLabel::Text("2024-01-01".to_string()))
        );
        assert_eq!(days[0].min_temp, Some(8.0));
        assert_eq!(days[0].max_temp, Some(18.0));
        assert_eq!(days[0].summary.as_deref(), Some("clear"));
        assert_eq!(days[0].icon.as_deref(), Some("01d"));
        assert_eq!(
            days[1].date,
            Some(DayLabel::Text("2024-01-02".to_string()))
        );
    }

    #[test]
    fn aggregation_is_deterministic() {
        let raw = interval_fixture();
        assert_eq!(aggregate_daily(&raw, 5), aggregate_daily(&raw, 5));
    }

    #[test]
    fn output_dates_are_unique_and_ascending() {
        let days = aggregate_daily(&interval_fixture(), 5);
        let dates: Vec<_> = days.iter().map(|d| d.date.clone()).collect();
        let mut sorted = dates.clone();
        sorted.sort_by_key(|d| match d {
            Some(DayLabel::Text(s)) => s.clone(),
            _ => String::new(),
        });
        sorted.dedup();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn respects_max_days_bound() {
        let raw = interval_fixture();
        assert!(aggregate_daily(&raw, 0).is_empty());
        assert_eq!(aggregate_daily(&raw, 1).len(), 1);
        assert_eq!(aggregate_daily(&raw, 10).len(), 2);
    }

    #[test]
    fn skips_entries_without_timestamp() {
        let raw = RawForecast::parse(&json!({
            "list": [
                {"main": {"temp": 100.0}, "weather": [{"description": "phantom"}]},
                {
                    "dt": 1_704_078_000i64,
                    "main": {"temp": 12.0, "temp_min": 10.0, "temp_max": 15.0},
                    "weather": [{"description": "clear", "icon": "01d"}]
                }
            ]
        }));
        let days = aggregate_daily(&raw, 5);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].min_temp, Some(10.0));
    }

    #[test]
    fn falls_back_to_point_temps_when_bounds_missing() {
        let raw = RawForecast::parse(&json!({
            "list": [
                {"dt": 1_704_078_000i64, "main": {"temp": 12.0}},
                {"dt": 1_704_081_600i64, "main": {"temp": 9.5}}
            ]
        }));
        let days = aggregate_daily(&raw, 5);
        assert_eq!(days[0].min_temp, Some(9.5));
        assert_eq!(days[0].max_temp, Some(12.0));
        assert_eq!(days[0].summary, None);
        assert_eq!(days[0].icon, None);
    }

    #[test]
    fn absent_temps_stay_absent() {
        let raw = RawForecast::parse(&json!({
            "list": [{"dt": 1_704_078_000i64, "weather": [{"description": "hazy"}]}]
        }));
        let days = aggregate_daily(&raw, 5);
        assert_eq!(days[0].min_temp, None);
        assert_eq!(days[0].max_temp, None);
        assert_eq!(days[0].summary.as_deref(), Some("hazy"));
    }

    #[test]
    fn bucketed_days_pass_through_unreformatted() {
        let raw = RawForecast::parse(&json!({
            "daily": [
                {
                    "dt": 0,
                    "temp": {"min": 10.0, "max": 20.0},
                    "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}]
                }
            ]
        }));
        let days = aggregate_daily(&raw, 1);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, Some(DayLabel::Epoch(0)));
        assert_eq!(days[0].min_temp, Some(10.0));
        assert_eq!(days[0].max_temp, Some(20.0));
        assert_eq!(days[0].summary.as_deref(), Some("clear sky"));
    }

    #[test]
    fn bucketed_list_is_capped_in_given_order() {
        let raw = RawForecast::parse(&json!({
            "daily": [
                {"dt": 0, "temp": {"min": 10.0, "max": 20.0}, "weather": []},
                {"dt": 1, "temp": {"min": 11.0, "max": 21.0}, "weather": []},
                {"dt": 2, "temp": {"min": 12.0, "max": 22.0}, "weather": []}
            ]
        }));
        let days = aggregate_daily(&raw, 2);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, Some(DayLabel::Epoch(0)));
        assert_eq!(days[1].date, Some(DayLabel::Epoch(1)));
        assert_eq!(days[0].summary, None);
    }

    #[test]
    fn empty_interval_list_yields_empty_series() {
        let raw = RawForecast::parse(&json!({"list": []}));
        assert!(aggregate_daily(&raw, 5).is_empty());
    }
}
