//! Assistant launch, transcript and status handlers.

use crate::errors::AssistantError;
use crate::registry::TranscriptLine;
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct StartAssistantRequest {
    #[serde(default)]
    pub call_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartAssistantResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: Vec<TranscriptLine>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    NotFound {
        status: &'static str,
    },
    Known {
        call_id: String,
        is_active: bool,
        status: &'static str,
    },
}

/// Handler for POST /start-assistant
///
/// Launches the agent for the call in the background and answers at once.
/// Launching again for the same call replaces the earlier record.
#[instrument(skip_all, name = "assistant.start")]
pub async fn start_assistant(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartAssistantRequest>, JsonRejection>,
) -> Result<Json<StartAssistantResponse>, AssistantError> {
    let call_id = payload
        .map_err(|rejection| AssistantError::BadRequest(rejection.body_text()))
        .and_then(|Json(request)| {
            request
                .call_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AssistantError::BadRequest("call_id is required".to_string()))
        })
        .inspect_err(|e| {
            warn!(target: "assistant.api", status = e.status_code(), error = %e, "Rejected start request");
        })?;

    let generation = state.runner.launch(&call_id).await;
    info!(
        target: "assistant.api",
        call_id = %call_id,
        generation = generation,
        "Meeting assistant launched"
    );

    Ok(Json(StartAssistantResponse {
        status: "success",
        message: format!("Meeting assistant started for call {call_id}"),
    }))
}

/// Handler for GET /transcript/:call_id
///
/// Unknown calls have an empty transcript.
#[instrument(skip_all, name = "assistant.transcript", fields(call_id = %call_id))]
pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Json<TranscriptResponse> {
    Json(TranscriptResponse {
        transcript: state.runner.registry.transcript(&call_id).await,
    })
}

/// Handler for GET /status/:call_id
#[instrument(skip_all, name = "assistant.status", fields(call_id = %call_id))]
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Json<StatusResponse> {
    let response = match state.runner.registry.status(&call_id).await {
        None => StatusResponse::NotFound {
            status: "not_found",
        },
        Some(status) => StatusResponse::Known {
            call_id,
            is_active: status.is_active,
            status: if status.is_active { "active" } else { "inactive" },
        },
    };
    Json(response)
}
