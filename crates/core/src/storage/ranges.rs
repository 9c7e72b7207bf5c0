use crate::domain::records::{NewRangeRecord, RangeRecord, RangeRecordUpdate};
use anyhow::Context;
use sqlx::PgPool;

const RETURNING: &str =
    "RETURNING id, query, lat, lng, start_date, end_date, summary, created_at";

pub async fn insert_range_record(
    pool: &PgPool,
    record: &NewRangeRecord,
) -> anyhow::Result<RangeRecord> {
    sqlx::query_as(&format!(
        "INSERT INTO range_records (query, lat, lng, start_date, end_date, summary) \
         VALUES ($1, $2, $3, $4, $5, $6) {RETURNING}"
    ))
    .bind(&record.query)
    .bind(record.lat)
    .bind(record.lng)
    .bind(&record.start_date)
    .bind(&record.end_date)
    .bind(&record.summary)
    .fetch_one(pool)
    .await
    .context("insert range_records failed")
}

pub async fn list_range_records(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<RangeRecord>> {
    sqlx::query_as(
        "SELECT id, query, lat, lng, start_date, end_date, summary, created_at \
         FROM range_records ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("list range_records failed")
}

pub async fn update_range_record(
    pool: &PgPool,
    id: i32,
    patch: &RangeRecordUpdate,
) -> anyhow::Result<Option<RangeRecord>> {
    sqlx::query_as(&format!(
        "UPDATE range_records SET \
           query = COALESCE($2, query), \
           lat = COALESCE($3, lat), \
           lng = COALESCE($4, lng), \
           start_date = COALESCE($5, start_date), \
           end_date = COALESCE($6, end_date), \
           summary = COALESCE($7, summary) \
         WHERE id = $1 {RETURNING}"
    ))
    .bind(id)
    .bind(&patch.query)
    .bind(patch.lat)
    .bind(patch.lng)
    .bind(&patch.start_date)
    .bind(&patch.end_date)
    .bind(&patch.summary)
    .fetch_optional(pool)
    .await
    .context("update range_records failed")
}

pub async fn delete_range_record(pool: &PgPool, id: i32) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM range_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete range_records failed")?;
    Ok(res.rows_affected() > 0)
}
