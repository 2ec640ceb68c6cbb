use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::handlers::AnalysisController;
use crate::models::{AnalysisResult, View};
use crate::services::PreviewStore;

/// What the page renders: exactly one view name, with the payload that
/// view needs. Built as a pure function of controller state.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub view: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl StateResponse {
    pub fn from_view(view: View, preview_token: Option<u64>) -> Self {
        let preview_url = preview_token.map(|token| format!("/preview/{}", token));
        match view {
            View::Start => Self {
                view: "start",
                message: None,
                analysis: None,
                // No image survives into the start view.
                preview_url: None,
            },
            View::Loading => Self {
                view: "loading",
                message: None,
                analysis: None,
                preview_url,
            },
            View::Error(message) => Self {
                view: "error",
                message: Some(message),
                analysis: None,
                preview_url,
            },
            View::NotFood => Self {
                view: "not_food",
                message: None,
                analysis: None,
                preview_url,
            },
            View::Result(analysis) => Self {
                view: "result",
                message: None,
                analysis: Some(analysis),
                preview_url,
            },
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AnalysisController>,
    pub previews: Arc<PreviewStore>,
}

pub fn create_router(controller: Arc<AnalysisController>, previews: Arc<PreviewStore>) -> Router {
    let state = AppState {
        controller,
        previews,
    };

    Router::new()
        .route("/", get(index))
        .route("/api/analyze", post(analyze))
        .route("/api/retry", post(retry))
        .route("/api/reset", post(reset))
        .route("/api/state", get(current_state))
        .route("/preview/:token", get(preview))
        .route("/health", get(health_check))
        // Phone photos easily exceed the 2 MB default.
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
        .with_state(state)
}

fn current_response(controller: &AnalysisController) -> Json<StateResponse> {
    let view = View::from_state(&controller.state());
    Json(StateResponse::from_view(view, controller.preview_token()))
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn current_state(State(state): State<AppState>) -> Json<StateResponse> {
    current_response(&state.controller)
}

/// One submission: multipart field `image` with the photo. Drives the
/// request to completion and answers with the resulting view.
async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StateResponse>, StatusCode> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        log::error!("❌ Failed to read multipart upload: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        if field.name() == Some("image") {
            content_type = field.content_type().map(|c| c.to_string());
            image_bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| {
                        log::error!("❌ Failed to read image field: {}", e);
                        StatusCode::BAD_REQUEST
                    })?
                    .to_vec(),
            );
        }
    }

    let bytes = image_bytes.ok_or(StatusCode::BAD_REQUEST)?;
    log::info!("📨 Analyze request: {} bytes, type {:?}", bytes.len(), content_type);

    state.controller.analyze_image(bytes, content_type).await;
    Ok(current_response(&state.controller))
}

async fn retry(State(state): State<AppState>) -> Json<StateResponse> {
    state.controller.retry_analysis().await;
    current_response(&state.controller)
}

async fn reset(State(state): State<AppState>) -> Json<StateResponse> {
    state.controller.reset();
    current_response(&state.controller)
}

/// Serve the preview image for the currently selected file. Gone once
/// the controller releases it.
async fn preview(
    State(state): State<AppState>,
    Path(token): Path<u64>,
) -> Result<impl IntoResponse, StatusCode> {
    let (mime_type, bytes) = state.previews.get(token).ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, mime_type)], bytes))
}
