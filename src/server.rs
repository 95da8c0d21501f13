use axum::{
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::clip::{ClipRequest, Clipper, TemplateSource};
use crate::error::ClipError;
use crate::extract::{extract, fetch_page};
use crate::flows::{FlowSelection, GENERIC_FLOW_ID};
use crate::record::{get_non_blank, Record};

const SERVER_NAME: &str = "vault-agent";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub type AppState = Arc<Clipper>;

#[derive(Debug, Deserialize)]
struct FlowsRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractRequest {
    url: String,
    /// Page HTML captured by the extension. Fetched from `url` when absent.
    html: Option<String>,
    flow_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest {
    flow_id: Option<String>,
    #[serde(default)]
    extracted: Record,
    #[serde(default)]
    form: Record,
    template: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClipBody {
    flow_id: String,
    #[serde(default)]
    extracted: Record,
    #[serde(default)]
    form: Record,
    template_path: Option<String>,
    template: Option<String>,
}

/// A [`ClipError`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(ClipError);

impl From<ClipError> for ApiError {
    fn from(err: ClipError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ClipError::UnknownFlow(_) => StatusCode::NOT_FOUND,
            ClipError::Configuration(_) | ClipError::TemplateMissing(_) | ClipError::Settings(_) => {
                StatusCode::BAD_REQUEST
            }
            ClipError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClipError::TemplateRead { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ClipError::TemplateFetch { .. } | ClipError::Vault(_) | ClipError::Write(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/flows", post(handle_flows))
        .route("/extract", post(handle_extract))
        .route("/render", post(handle_render))
        .route("/clip", post(handle_clip))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the local API on 127.0.0.1 until the process ends.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind to {}: {}", addr, e))?;

    info!("listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// Health check endpoint
async fn handle_health(AxumState(state): AxumState<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": SERVER_NAME,
        "version": SERVER_VERSION,
        "flows": state.registry.all_flows().len(),
        "writer": state.settings.writer,
    }))
}

// Which flows apply to a URL
async fn handle_flows(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<FlowsRequest>,
) -> Json<Value> {
    let (selection, flows) = match state.registry.select_flow(&request.url) {
        FlowSelection::Single(flow) => ("single", vec![flow.summary()]),
        FlowSelection::Choice(flows) => ("choice", flows.iter().map(|f| f.summary()).collect()),
        FlowSelection::NoMatch => ("none", Vec::new()),
    };
    Json(json!({ "selection": selection, "flows": flows }))
}

// Extract page data and prefill the form
async fn handle_extract(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<Value>, ApiError> {
    let flow = match request.flow_id.as_deref() {
        Some(id) => state.flow(id)?,
        None => state
            .registry
            .detect_flow(&request.url)
            .ok_or_else(|| ClipError::UnknownFlow(GENERIC_FLOW_ID.to_string()))?,
    };

    let html = match request.html {
        Some(html) => html,
        None => fetch_page(&request.url, state.settings.request_timeout()).await?,
    };
    let extracted = extract(flow.kind, &html, &request.url)?;
    let form = state.prepare_form(flow, &extracted);

    Ok(Json(json!({
        "flow": flow.summary(),
        "extracted": extracted,
        "form": form,
    })))
}

// Render a note from an inline template
async fn handle_render(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<Value>, ApiError> {
    let flow_id = request
        .flow_id
        .or_else(|| get_non_blank(&request.extracted, "flowType"))
        .unwrap_or_else(|| GENERIC_FLOW_ID.to_string());
    let clip = ClipRequest {
        flow_id,
        extracted: request.extracted,
        form: request.form,
        template: Some(TemplateSource::Inline(request.template)),
    };
    let note = state.render(&clip).await?;
    Ok(Json(json!(note)))
}

// Render and write a note
async fn handle_clip(
    AxumState(state): AxumState<AppState>,
    Json(body): Json<ClipBody>,
) -> Result<Json<Value>, ApiError> {
    let template = match (body.template, body.template_path) {
        (Some(text), _) => Some(TemplateSource::Inline(text)),
        (None, Some(path)) => Some(TemplateSource::Vault(path)),
        (None, None) => None,
    };
    let clip = ClipRequest {
        flow_id: body.flow_id,
        extracted: body.extracted,
        form: body.form,
        template,
    };
    let outcome = state.clip(&clip).await?;
    Ok(Json(json!(outcome)))
}
