//! axum router and server lifecycle.

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::db::Database;
use crate::error::{ErrorResponse, MigrationError};
use crate::migrate::run_migration_async;
use crate::source::SourceReader;

pub const API_PREFIX: &str = "/api/grp_reporter";

const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost", "http://localhost:8080"];

/// State shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    source: Arc<dyn SourceReader>,
    target: Database,
}

impl ApiState {
    pub fn new(source: Arc<dyn SourceReader>, target: Database) -> Self {
        Self { source, target }
    }
}

/// An error body with its HTTP status.
struct ApiError(StatusCode, ErrorResponse);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

impl From<MigrationError> for ApiError {
    fn from(err: MigrationError) -> Self {
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct PingResponse {
    status: &'static str,
    version: &'static str,
}

async fn ping() -> impl IntoResponse {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run a migration; 500 with the report when any project failed.
async fn migrate(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let report = run_migration_async(Arc::clone(&state.source), state.target.clone()).await?;
    let status = if report.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(report)).into_response())
}

async fn projects(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let projects = state.target.project_overviews()?;
    Ok(Json(projects).into_response())
}

#[derive(Debug, Deserialize)]
struct BaselinesQuery {
    project_id: i64,
}

async fn baselines(
    State(state): State<ApiState>,
    Query(query): Query<BaselinesQuery>,
) -> Result<Response, ApiError> {
    match state.target.base_plan_details(query.project_id)? {
        Some(plans) => Ok(Json(plans).into_response()),
        None => Err(ApiError(
            StatusCode::NOT_FOUND,
            ErrorResponse::project_not_found(query.project_id),
        )),
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    ApiError(StatusCode::NOT_FOUND, ErrorResponse::not_found_api(uri.path()))
}

fn cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

/// Build the router with all routes.
pub fn build_router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/ping/", get(ping))
        .route("/migrate/", get(migrate))
        .route("/project/", get(projects))
        .route("/baselines/", get(baselines));

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on `host:port`.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    state: ApiState,
    host: &str,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("API listening on http://{}{}", bound_addr, API_PREFIX);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn ping_response_serialization() {
        let response = PingResponse {
            status: "ok",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
    }

    #[test]
    fn api_error_keeps_code() {
        let err: ApiError = MigrationError::InvalidSource("x".into()).into();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.1.code, ErrorCode::InvalidSource);
    }
}
