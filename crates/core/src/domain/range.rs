use crate::domain::forecast::{aggregate_daily, DailySummary, DayLabel, RawForecast};
use crate::error::ServiceError;
use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive span cap for simulated historical queries.
pub const MAX_RANGE_DAYS: i64 = 7;

/// How many aggregated days the forecast window can supply.
const FORECAST_WINDOW_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSeries {
    pub range: DateRange,
    pub series: Vec<DailySummary>,
}

/// Answer a historical-range query against the short-range forecast. There is
/// no true archive; the forecast window stands in for one, so a range that
/// validates but matches no aggregated dates is a distinct `NotFound` rather
/// than a silent empty series.
pub fn resolve_range(
    raw: &RawForecast,
    start: &str,
    end: &str,
) -> Result<RangeSeries, ServiceError> {
    let (Ok(start_date), Ok(end_date)) = (parse_iso_date(start), parse_iso_date(end)) else {
        return Err(ServiceError::InvalidRange(
            "Invalid date format. Use YYYY-MM-DD".to_string(),
        ));
    };

    if start_date > end_date {
        return Err(ServiceError::InvalidRange(
            "start must be on or before end".to_string(),
        ));
    }

    if (end_date - start_date).num_days() + 1 > MAX_RANGE_DAYS {
        return Err(ServiceError::InvalidRange(
            "Date range too large. Maximum 7 days supported".to_string(),
        ));
    }

    let aggregated = aggregate_daily(raw, FORECAST_WINDOW_DAYS);

    let start_s = start_date.to_string();
    let end_s = end_date.to_string();

    // Lexicographic compare is chronological for zero-padded ISO dates. Epoch
    // passthrough labels (mock bucketed data) never land inside the window.
    let series: Vec<DailySummary> = aggregated
        .into_iter()
        .filter(|day| match &day.date {
            Some(DayLabel::Text(d)) => start_s.as_str() <= d.as_str() && d.as_str() <= end_s.as_str(),
            _ => false,
        })
        .collect();

    if series.is_empty() {
        return Err(ServiceError::NotFound(
            "Requested range is outside supported forecast window".to_string(),
        ));
    }

    Ok(RangeSeries {
        range: DateRange {
            start: start_date,
            end: end_date,
        },
        series,
    })
}

fn parse_iso_date(s: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn march_forecast() -> RawForecast {
        // 2024-03-05 06:00Z and 2024-03-06 06:00Z.
        RawForecast::parse(&json!({
            "list": [
                {
                    "dt": 1_709_618_400i64,
                    "main": {"temp": 10.0, "temp_min": 8.0, "temp_max": 12.0},
                    "weather": [{"description": "overcast clouds", "icon": "04d"}]
                },
                {
                    "dt": 1_709_704_800i64,
                    "main": {"temp": 11.0, "temp_min": 9.0, "temp_max": 13.0},
                    "weather": [{"description": "scattered clouds", "icon": "03d"}]
                }
            ]
        }))
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = resolve_range(&march_forecast(), "2024-3-5", "2024-03-06").unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidRange("Invalid date format. Use YYYY-MM-DD".to_string())
        );
        let err = resolve_range(&march_forecast(), "2024-03-05", "not-a-date").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRange(_)));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = resolve_range(&march_forecast(), "2024-03-10", "2024-03-05").unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidRange("start must be on or before end".to_string())
        );
    }

    #[test]
    fn rejects_span_over_seven_days() {
        let err = resolve_range(&march_forecast(), "2024-03-01", "2024-03-09").unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidRange(
                "Date range too large. Maximum 7 days supported".to_string()
            )
        );
    }

    #[test]
    fn seven_day_span_is_allowed() {
        // 2024-03-01..=2024-03-07 is exactly seven days; it validates and then
        // fails only because the forecast holds later dates.
        let err = resolve_range(&march_forecast(), "2024-02-26", "2024-03-03").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn empty_window_is_not_found() {
        let err = resolve_range(&march_forecast(), "2024-04-01", "2024-04-03").unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotFound(
                "Requested range is outside supported forecast window".to_string()
            )
        );
    }

    #[test]
    fn returns_inclusive_slice_in_order() {
        let out = resolve_range(&march_forecast(), "2024-03-05", "2024-03-06").unwrap();
        assert_eq!(
            out.range.start,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(out.series.len(), 2);
        assert_eq!(
            out.series[0].date,
            Some(crate::domain::forecast::DayLabel::Text("2024-03-05".to_string()))
        );
        assert_eq!(out.series[0].summary.as_deref(), Some("overcast clouds"));
    }

    #[test]
    fn single_day_slice() {
        let out = resolve_range(&march_forecast(), "2024-03-06", "2024-03-06").unwrap();
        assert_eq!(out.series.len(), 1);
        assert_eq!(out.series[0].min_temp, Some(9.0));
    }

    #[test]
    fn epoch_passthrough_dates_never_match() {
        let raw = RawForecast::parse(&json!({
            "daily": [{"dt": 0, "temp": {"min": 10.0, "max": 20.0}, "weather": []}]
        }));
        let err = resolve_range(&raw, "2024-03-05", "2024-03-06").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
