use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atmos_core::domain::location::ResolvedLocation;
use atmos_core::error::{HttpErrorInfo, ServiceError};
use atmos_core::provider::opencage::OpenCageClient;
use atmos_core::service::location::{LocationService, StoredLocation};
use atmos_core::store::HttpRecordStore;

type Service = LocationService<OpenCageClient, HttpRecordStore>;
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

    let geocoder = OpenCageClient::from_settings(&settings)?;
    let store = HttpRecordStore::from_settings(&settings)?;
    let state = AppState {
        service: Arc::new(LocationService::new(geocoder, store)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/location/resolve", post(resolve))
        .route("/api/v1/location/resolve-and-save", post(resolve_and_save))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8001);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "location service listening");

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
struct ResolveRequest {
    query: String,
}

async fn resolve(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolvedLocation>, ErrorResponse> {
    let out = state
        .service
        .resolve_only(&req.query)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

async fn resolve_and_save(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<StoredLocation>, ErrorResponse> {
    let out = state
        .service
        .resolve_and_store(&req.query)
        .await
        .map_err(error_response)?;
    Ok(Json(out))
}

fn error_response(err: ServiceError) -> ErrorResponse {
    if matches!(err, ServiceError::Upstream(_)) {
        tracing::error!(error = %err, "location request failed upstream");
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
