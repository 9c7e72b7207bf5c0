use crate::domain::location::ResolvedLocation;
use crate::domain::records::{LocationRecord, LocationUpdate};
use crate::error::ServiceError;
use anyhow::Context;
use sqlx::PgPool;

const RETURNING: &str = "RETURNING id, query, lat, lng, display_name, source, created_at";

pub async fn insert_location(
    pool: &PgPool,
    loc: &ResolvedLocation,
) -> anyhow::Result<LocationRecord> {
    let query = loc.query.trim();

    if !query.is_empty() {
        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM locations WHERE lower(query) = lower($1) LIMIT 1")
                .bind(query)
                .fetch_optional(pool)
                .await
                .context("select existing location failed")?;

        if let Some((id,)) = existing {
            anyhow::bail!(ServiceError::Conflict(format!(
                "'{query}' is already saved (id={id})."
            )));
        }
    }

    let record: LocationRecord = sqlx::query_as(&format!(
        "INSERT INTO locations (query, lat, lng, display_name, source) \
         VALUES ($1, $2, $3, $4, $5) {RETURNING}"
    ))
    .bind(query)
    .bind(loc.lat)
    .bind(loc.lng)
    .bind(&loc.display_name)
    .bind(&loc.source)
    .fetch_one(pool)
    .await
    .context("insert locations failed")?;

    Ok(record)
}

pub async fn list_locations(pool: &PgPool) -> anyhow::Result<Vec<LocationRecord>> {
    sqlx::query_as(
        "SELECT id, query, lat, lng, display_name, source, created_at \
         FROM locations ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
    .context("list locations failed")
}

pub async fn update_location(
    pool: &PgPool,
    id: i32,
    patch: &LocationUpdate,
) -> anyhow::Result<Option<LocationRecord>> {
    sqlx::query_as(&format!(
        "UPDATE locations SET \
           query = COALESCE($2, query), \
           lat = COALESCE($3, lat), \
           lng = COALESCE($4, lng), \
           display_name = COALESCE($5, display_name), \
           source = COALESCE($6, source) \
         WHERE id = $1 {RETURNING}"
    ))
    .bind(id)
    .bind(&patch.query)
    .bind(patch.lat)
    .bind(patch.lng)
    .bind(&patch.display_name)
    .bind(&patch.source)
    .fetch_optional(pool)
    .await
    .context("update locations failed")
}

pub async fn delete_location(pool: &PgPool, id: i32) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete locations failed")?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_all_locations(pool: &PgPool) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM locations")
        .execute(pool)
        .await
        .context("delete all locations failed")?;
    Ok(res.rows_affected())
}
