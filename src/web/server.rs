//! HTTP service layer - routing, request parsing, CORS
//!
//! Thin boundary over the pipeline. All invariants live below this layer;
//! handlers only translate requests in and errors out.

use crate::chart;
use crate::error::PipelineError;
use crate::pipeline::{AskMode, QueryPipeline};
use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
pub struct AppState {
    pub pipeline: QueryPipeline,
}

pub type SharedState = Arc<AppState>;

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskTextResponse {
    sql: String,
    rows: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Pipeline error mapped to an HTTP response. The precise kind goes to the
/// log; the body carries only the short user-facing message.
struct ApiError(PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            PipelineError::EmptyResult => StatusCode::NOT_FOUND,
            PipelineError::ChartRender(_) | PipelineError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(status = %status, error = %self.0, "request failed");
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::permissive().expose_headers([HeaderName::from_static("x-sql")]);

    Router::new()
        .route("/ask-text", post(ask_text))
        .route("/ask-visual", post(ask_visual))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(bind_host: &str, bind_port: u16, state: SharedState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_host, bind_port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask_text(
    State(state): State<SharedState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskTextResponse>, ApiError> {
    let outcome = state.pipeline.ask(&req.question, AskMode::Text).await?;

    Ok(Json(AskTextResponse {
        sql: outcome.sql.into_string(),
        rows: outcome.rows.iter().map(|r| r.to_json()).collect(),
    }))
}

async fn ask_visual(
    State(state): State<SharedState>,
    Json(req): Json<AskRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.pipeline.ask(&req.question, AskMode::Visual).await?;

    let series = chart::shape_series(&outcome.rows)?;
    let png = chart::render_bar_chart(&series, &req.question)?;

    // Sanitized single-line SQL travels as response metadata
    let sql_header = chart::sanitize_header_value(outcome.sql.as_str());
    let sql_header = HeaderValue::from_str(&sql_header)
        .map_err(|e| PipelineError::ChartRender(format!("header value: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (HeaderName::from_static("x-sql"), sql_header),
        ],
        png,
    )
        .into_response())
}
