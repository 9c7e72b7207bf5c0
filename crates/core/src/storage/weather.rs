use crate::domain::records::{NewWeatherRecord, SnapshotKind, WeatherRecord, WeatherRecordUpdate};
use crate::error::ServiceError;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

// A fresh "current" snapshot for the same coordinates inside this window is
// rejected rather than duplicated.
const RESAVE_THROTTLE_SECS: i64 = 120;

const RETURNING: &str = "RETURNING id, location_id, lat, lng, snapshot, kind, created_at";

pub async fn insert_weather_record(
    pool: &PgPool,
    record: &NewWeatherRecord,
) -> anyhow::Result<WeatherRecord> {
    if record.kind == SnapshotKind::Current {
        let last: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT created_at FROM weather_records \
             WHERE lat = $1 AND lng = $2 AND kind = $3 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(record.lat)
        .bind(record.lng)
        .bind(record.kind.as_str())
        .fetch_optional(pool)
        .await
        .context("select last weather record failed")?;

        if let Some((created_at,)) = last {
            let age_secs = (Utc::now() - created_at).num_seconds();
            if age_secs < RESAVE_THROTTLE_SECS {
                anyhow::bail!(ServiceError::Conflict(format!(
                    "Weather for ({}, {}) was saved {age_secs}s ago. Please wait before saving again.",
                    record.lat, record.lng
                )));
            }
        }
    }

    let stored: WeatherRecord = sqlx::query_as(&format!(
        "INSERT INTO weather_records (location_id, lat, lng, snapshot, kind) \
         VALUES ($1, $2, $3, $4, $5) {RETURNING}"
    ))
    .bind(record.location_id)
    .bind(record.lat)
    .bind(record.lng)
    .bind(&record.snapshot)
    .bind(record.kind.as_str())
    .fetch_one(pool)
    .await
    .context("insert weather_records failed")?;

    Ok(stored)
}

pub async fn list_weather_records(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<WeatherRecord>> {
    sqlx::query_as(
        "SELECT id, location_id, lat, lng, snapshot, kind, created_at \
         FROM weather_records ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("list weather_records failed")
}

pub async fn update_weather_record(
    pool: &PgPool,
    id: i32,
    patch: &WeatherRecordUpdate,
) -> anyhow::Result<Option<WeatherRecord>> {
    sqlx::query_as(&format!(
        "UPDATE weather_records SET \
           location_id = COALESCE($2, location_id), \
           lat = COALESCE($3, lat), \
           lng = COALESCE($4, lng), \
           snapshot = COALESCE($5, snapshot), \
           kind = COALESCE($6, kind) \
         WHERE id = $1 {RETURNING}"
    ))
    .bind(id)
    .bind(patch.location_id)
    .bind(patch.lat)
    .bind(patch.lng)
    .bind(&patch.snapshot)
    .bind(&patch.kind)
    .fetch_optional(pool)
    .await
    .context("update weather_records failed")
}

pub async fn delete_weather_record(pool: &PgPool, id: i32) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM weather_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete weather_records failed")?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_all_weather_records(pool: &PgPool) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM weather_records")
        .execute(pool)
        .await
        .context("delete all weather_records failed")?;
    Ok(res.rows_affected())
}
