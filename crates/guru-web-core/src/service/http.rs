use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Response, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::engine::QueryRequest;
use crate::error::GateError;
use crate::format::{self, OutputFormat, PLAIN_CONTENT_TYPE};
use crate::position::{self, ByteRange, Selection};
use crate::telemetry;

use super::server::AppContext;
use super::{assets, view};

type SharedContext = Arc<AppContext>;

#[derive(Debug, Deserialize)]
pub struct SourceParams {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    #[serde(default)]
    pub path: Option<String>,
    /// Selection as `startLine.startCol-endLine.endCol`.
    #[serde(default)]
    pub s: Option<String>,
    /// `raw` returns the bytes unmodified.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

impl IntoResponse for GateError {
    fn into_response(self) -> axum::response::Response {
        match self {
            GateError::ScopeViolation { .. } => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            GateError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            GateError::InvalidQuery { .. } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            GateError::Engine(_) | GateError::Format(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Routes of the web front-end.
pub fn router(context: SharedContext) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/source", get(source))
        .route("/file", get(file))
        .route("/query", get(query))
        .route("/static/*name", get(static_file))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .with_state(context)
}

/// Start the HTTP server and run until shutdown.
pub async fn serve(addr: SocketAddr, context: SharedContext) -> Result<()> {
    let app = router(context);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP address {addr}"))?;
    tracing::info!(url = %format!("http://{addr}/"), "serving");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .with_context(|| format!("failed to run HTTP server on {addr}"))
}

fn remote_addr(info: Option<ConnectInfo<SocketAddr>>) -> Option<SocketAddr> {
    info.map(|ConnectInfo(addr)| addr)
}

async fn index(State(context): State<SharedContext>) -> Html<String> {
    Html(view::index_page(
        &context.scope_label,
        &context.packages,
        context.gate.scope().files(),
    ))
}

async fn source(
    State(context): State<SharedContext>,
    info: Option<ConnectInfo<SocketAddr>>,
    Query(params): Query<SourceParams>,
) -> Result<Html<String>, GateError> {
    let file = params.file.unwrap_or_default();
    let content = context
        .gate
        .serve_file_content(&file, remote_addr(info))
        .await?;
    Ok(Html(view::source_page(&file, position::line_count(&content))))
}

async fn file(
    State(context): State<SharedContext>,
    info: Option<ConnectInfo<SocketAddr>>,
    Query(params): Query<FileParams>,
) -> Result<axum::response::Response, GateError> {
    let path = params.path.unwrap_or_default();
    let content = context
        .gate
        .serve_file_content(&path, remote_addr(info))
        .await?;

    if params.format.as_deref() == Some("raw") {
        return Ok(([(CONTENT_TYPE, PLAIN_CONTENT_TYPE)], content).into_response());
    }

    let range = params
        .s
        .as_deref()
        .and_then(|sel| selection_range(sel, &content));
    Ok(Html(view::highlighted(&content, range)).into_response())
}

/// Resolve a selection against `content`. Malformed or unresolvable
/// selections leave the file unhighlighted.
fn selection_range(sel: &str, content: &[u8]) -> Option<ByteRange> {
    let selection = match sel.parse::<Selection>() {
        Ok(selection) => selection,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring selection");
            return None;
        }
    };
    match selection.byte_offsets_in(content) {
        Ok(range) => Some(range),
        Err(err) => {
            tracing::debug!(selection = sel, error = %err, "ignoring selection");
            None
        }
    }
}

async fn query(
    State(context): State<SharedContext>,
    info: Option<ConnectInfo<SocketAddr>>,
    Query(params): Query<QueryParams>,
) -> axum::response::Response {
    let mode = params.mode.unwrap_or_default();
    if mode.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "mode is required".to_string(),
            }),
        )
            .into_response();
    }

    let output = OutputFormat::from_param(params.format.as_deref());
    let request = QueryRequest::new(mode, params.pos.unwrap_or_default(), output);

    let report = match context.gate.run_query(&request, remote_addr(info)).await {
        Ok(report) => report,
        Err(err) => return err.into_response(),
    };

    match format::render(report.as_ref(), output) {
        Ok(rendered) => ([(CONTENT_TYPE, rendered.content_type)], rendered.body).into_response(),
        Err(err) => {
            tracing::error!(mode = %request.mode, pos = %request.pos, error = %err, "failed to render result");
            telemetry::record_query_failure("format");
            GateError::from(err).into_response()
        }
    }
}

async fn static_file(Path(name): Path<String>) -> axum::response::Response {
    match assets::lookup(&name) {
        Some(asset) => ([(CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn metrics() -> Result<Response<Body>, StatusCode> {
    match crate::telemetry::export_prometheus() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")
            .body(Body::from(body))
            .map_err(|err| {
                tracing::error!(error = %err, "failed to build metrics response");
                StatusCode::INTERNAL_SERVER_ERROR
            }),
        Err(err) => {
            tracing::error!(error = %err, "failed to export metrics");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
