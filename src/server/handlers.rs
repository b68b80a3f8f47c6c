use super::types::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
use crate::{
    Error,
    chatlog::{ChatLog, ChatLogEntry},
    llm::{Inference, compose_prompt},
};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, Json},
};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub inference: Arc<Inference>,
    pub chat_log: Arc<ChatLog>,
    pub model_name: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model_name.clone(),
    })
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat request body: {}", rejection.body_text());
        api_error(rejection.status(), rejection.body_text())
    })?;

    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        match respond(&state, request).await {
            Ok(response) => {
                info!("Chat request completed");
                Ok(Json(ChatResponse { response }))
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                Err(api_error(e.status_code(), format!("Processing error: {e}")))
            }
        }
    }
    .instrument(span)
    .await
}

/// Generate, then log, then answer. A failed log write fails the request.
async fn respond(state: &AppState, request: ChatRequest) -> Result<String, Error> {
    let system = request.system.unwrap_or_default();
    let prompt = request.prompt.unwrap_or_default();

    info!(
        "Received chat request ({} system bytes, {} prompt bytes)",
        system.len(),
        prompt.len()
    );

    let response = state
        .inference
        .generate(compose_prompt(&system, &prompt))
        .await?;

    let entry = ChatLogEntry::new(system, prompt, response);
    state.chat_log.append(&entry).await?;

    Ok(entry.response)
}
