use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atmos_core::error::{HttpErrorInfo, ServiceError};
use atmos_core::provider::openweather::OpenWeatherClient;
use atmos_core::service::weather::{
    CurrentWeather, ForecastBundle, StoredCurrentWeather, StoredForecastBundle, WeatherService,
    DEFAULT_FORECAST_DAYS,
};
use atmos_core::store::HttpRecordStore;

type Service = WeatherService<OpenWeatherClient, HttpRecordStore>;
type ErrorResponse = (StatusCode, Json<HttpErrorInfo>);

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
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

    let provider = OpenWeatherClient::from_settings(&settings)?;
    let store = HttpRecordStore::from_settings(&settings)?;
    let state = AppState {
        service: Arc::new(WeatherService::new(provider, store)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/weather/current", get(get_current))
        .route("/api/v1/weather/current-and-save", get(get_current_and_save))
        .route("/api/v1/weather/forecast", get(get_forecast))
        .route(
            "/api/v1/weather/forecast-and-save",
            get(get_forecast_and_save),
        )
        .route("/api/v1/weather/historical", get(get_historical))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8002);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "weather service listening");

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
struct CoordsQuery {
    lat: f64,
    lng: f64,
    location_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ForecastQuery {
    lat: f64,
    lng: f64,
    #[serde(default = "default_days")]
    days: usize,
    location_id: Option<i32>,
}

fn default_days() -> usize {
    DEFAULT_FORECAST_DAYS
}

#[derive(Debug, Deserialize)]
struct HistoricalQuery {
    lat: f64,
    lng: f64,
    start: String,
    end: String,
}

async fn get_current(
    State(state): State<AppState>,
    Query(q): Query<CoordsQuery>,
) -> Result<Json<CurrentWeather>, ErrorResponse> {
    let out = state
        .service
        .current_only(q.lat, q.lng)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

async fn get_current_and_save(
    State(state): State<AppState>,
    Query(q): Query<CoordsQuery>,
) -> Result<Json<StoredCurrentWeather>, ErrorResponse> {
    let out = state
        .service
        .current_and_store(q.lat, q.lng, q.location_id)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(q): Query<ForecastQuery>,
) -> Result<Json<ForecastBundle>, ErrorResponse> {
    let out = state
        .service
        .forecast_only(q.lat, q.lng, q.days)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

async fn get_forecast_and_save(
    State(state): State<AppState>,
    Query(q): Query<ForecastQuery>,
) -> Result<Json<StoredForecastBundle>, ErrorResponse> {
    let out = state
        .service
        .forecast_and_store(q.lat, q.lng, q.days, q.location_id)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

async fn get_historical(
    State(state): State<AppState>,
    Query(q): Query<HistoricalQuery>,
) -> Result<Json<atmos_core::domain::range::RangeSeries>, ErrorResponse> {
    let out = state
        .service
        .historical_range_only(q.lat, q.lng, &q.start, &q.end)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

fn error_response(err: ServiceError) -> ErrorResponse {
    if matches!(err, ServiceError::Upstream(_)) {
        tracing::error!(error = %err, "weather request failed upstream");
    }
    let body = HttpErrorInfo::from_service_error(&err);
    let status =
        StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body))
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
