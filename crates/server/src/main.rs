use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use server_api::{process_request, ApiContext};
use shared::{
    domain::PROCESS_ROUTE,
    error::{ApiError, ErrorCode},
    protocol::{ProcessRequest, ProcessResponse},
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let state = AppState {
        api: ApiContext::default(),
        max_body_bytes: settings.max_body_bytes,
        allowed_origins: settings.allowed_origins,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, route = PROCESS_ROUTE, "server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route("/healthz", get(healthz))
        .route(PROCESS_ROUTE, post(process_excel))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "skipping invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn process_excel(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ApiError>)> {
    let Json(request) = payload.map_err(|rejection| {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) => StatusCode::BAD_REQUEST,
            other => other.status(),
        };
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::Validation
        };
        warn!(%status, reason = %rejection.body_text(), "rejected request body");
        (status, Json(ApiError::new(code, rejection.body_text())))
    })?;

    info!(
        text_len = request.user_text.len(),
        has_file = request.attachment().is_some(),
        "process request received"
    );

    let response = process_request(&state.api, &request).map_err(|error| {
        warn!(code = ?error.code, message = %error.message, "process request failed");
        (status_for(&error.code), Json(error))
    })?;
    Ok(Json(response))
}

fn status_for(code: &ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::UnreadableSpreadsheet => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
