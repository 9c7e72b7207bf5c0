use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atmos_core::domain::location::ResolvedLocation;
use atmos_core::domain::records::{
    LocationRecord, LocationUpdate, NewRangeRecord, NewWeatherRecord, RangeRecord,
    RangeRecordUpdate, WeatherRecord, WeatherRecordUpdate,
};
use atmos_core::error::{HttpErrorInfo, ServiceError};
use atmos_core::storage;

mod export;

type ErrorResponse = (StatusCode, Json<HttpErrorInfo>);

#[derive(Debug, Clone)]
struct AppState {
    pool: Option<PgPool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = atmos_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting data service in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting data service in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting data service in degraded mode");
            None
        }
    };

    let state = AppState { pool };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/v1/records/location",
            get(list_locations).post(create_location),
        )
        .route(
            "/api/v1/records/location/:id",
            axum::routing::put(update_location).delete(delete_location),
        )
        .route(
            "/api/v1/records/weather",
            get(list_weather).post(create_weather),
        )
        .route(
            "/api/v1/records/weather/:id",
            axum::routing::put(update_weather).delete(delete_weather),
        )
        .route(
            "/api/v1/records/range",
            get(list_ranges).post(create_range),
        )
        .route(
            "/api/v1/records/range/:id",
            axum::routing::put(update_range).delete(delete_range),
        )
        .route("/api/v1/records/all/:resource", axum::routing::delete(delete_all))
        .route("/api/v1/records/export", get(export_records))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8003);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "data service listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<ResolvedLocation>,
) -> Result<Json<LocationRecord>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let created = storage::locations::insert_location(pool, &req)
        .await
        .map_err(error_response)?;
    Ok(Json(created))
}

async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocationRecord>>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let records = storage::locations::list_locations(pool)
        .await
        .map_err(error_response)?;
    Ok(Json(records))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<LocationUpdate>,
) -> Result<Json<LocationRecord>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let updated = storage::locations::update_location(pool, id, &patch)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found(format!("Location {id} not found")))?;
    Ok(Json(updated))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let deleted = storage::locations::delete_location(pool, id)
        .await
        .map_err(error_response)?;
    if !deleted {
        return Err(not_found(format!("Location {id} not found")));
    }
    Ok(Json(json!({"deleted": id})))
}

async fn create_weather(
    State(state): State<AppState>,
    Json(req): Json<NewWeatherRecord>,
) -> Result<Json<WeatherRecord>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let created = storage::weather::insert_weather_record(pool, &req)
        .await
        .map_err(error_response)?;
    Ok(Json(created))
}

async fn list_weather(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<WeatherRecord>>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let records = storage::weather::list_weather_records(pool, q.limit)
        .await
        .map_err(error_response)?;
    Ok(Json(records))
}

async fn update_weather(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<WeatherRecordUpdate>,
) -> Result<Json<WeatherRecord>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let updated = storage::weather::update_weather_record(pool, id, &patch)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found(format!("Weather record {id} not found")))?;
    Ok(Json(updated))
}

async fn delete_weather(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let deleted = storage::weather::delete_weather_record(pool, id)
        .await
        .map_err(error_response)?;
    if !deleted {
        return Err(not_found(format!("Weather record {id} not found")));
    }
    Ok(Json(json!({"deleted": id})))
}

async fn create_range(
    State(state): State<AppState>,
    Json(req): Json<NewRangeRecord>,
) -> Result<Json<RangeRecord>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let created = storage::ranges::insert_range_record(pool, &req)
        .await
        .map_err(error_response)?;
    Ok(Json(created))
}

async fn list_ranges(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<RangeRecord>>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let records = storage::ranges::list_range_records(pool, q.limit)
        .await
        .map_err(error_response)?;
    Ok(Json(records))
}

async fn update_range(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<RangeRecordUpdate>,
) -> Result<Json<RangeRecord>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let updated = storage::ranges::update_range_record(pool, id, &patch)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found(format!("Range record {id} not found")))?;
    Ok(Json(updated))
}

async fn delete_range(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let deleted = storage::ranges::delete_range_record(pool, id)
        .await
        .map_err(error_response)?;
    if !deleted {
        return Err(not_found(format!("Range record {id} not found")));
    }
    Ok(Json(json!({"deleted": id})))
}

async fn delete_all(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let pool = require_pool(&state)?;
    let (count, resource) = match resource.as_str() {
        "location" => (
            storage::locations::delete_all_locations(pool)
                .await
                .map_err(error_response)?,
            "locations",
        ),
        "weather" => (
            storage::weather::delete_all_weather_records(pool)
                .await
                .map_err(error_response)?,
            "weather",
        ),
        _ => {
            return Err(invalid_input(
                "Resource must be 'location' or 'weather'".to_string(),
            ))
        }
    };
    Ok(Json(json!({"deleted_count": count, "resource": resource})))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "json".to_string()
}

async fn export_records(
    State(state): State<AppState>,
    Query(q): Query<ExportQuery>,
) -> Result<Response, ErrorResponse> {
    let pool = require_pool(&state)?;

    let locations = storage::locations::list_locations(pool)
        .await
        .map_err(error_response)?;
    let weather = storage::weather::list_weather_records(pool, 1000)
        .await
        .map_err(error_response)?;

    match q.format.as_str() {
        "json" => Ok(Json(json!({"locations": locations, "weather": weather})).into_response()),
        "csv" => {
            let body = export::to_csv(&locations, &weather).map_err(error_response)?;
            Ok(([(header::CONTENT_TYPE, "text/csv")], body).into_response())
        }
        "md" => {
            let body = export::to_markdown(&locations, &weather);
            Ok(([(header::CONTENT_TYPE, "text/markdown")], body).into_response())
        }
        "xml" => {
            let body = export::to_xml(&locations, &weather);
            Ok(([(header::CONTENT_TYPE, "application/xml")], body).into_response())
        }
        _ => Err(invalid_input(
            "Unsupported format. Use json|csv|md|xml".to_string(),
        )),
    }
}

fn require_pool(state: &AppState) -> Result<&PgPool, ErrorResponse> {
    state.pool.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HttpErrorInfo::unavailable()),
    ))
}

fn not_found(detail: String) -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(HttpErrorInfo::from_service_error(&ServiceError::NotFound(
            detail,
        ))),
    )
}

fn invalid_input(detail: String) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(HttpErrorInfo::from_service_error(
            &ServiceError::InvalidInput(detail),
        )),
    )
}

fn error_response(err: anyhow::Error) -> ErrorResponse {
    if let Some(svc) = err.downcast_ref::<ServiceError>() {
        let body = HttpErrorInfo::from_service_error(svc);
        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(body));
    }

    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "records request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(HttpErrorInfo::internal(format!("{err:#}"))),
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &atmos_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
