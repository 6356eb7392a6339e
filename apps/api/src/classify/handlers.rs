//! Axum route handlers for classification and criteria management.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::CompletionOptions;
use crate::models::profile::Profile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(alias = "bios")]
    pub items: Vec<String>,
    /// Criteria for this call only. Blank means "use the stored criteria".
    pub criteria: Option<String>,
    pub model: Option<String>,
    pub reasoning_effort: Option<String>,
    pub verbosity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub results: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptUpdateRequest {
    pub criteria: String,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CriteriaResponse {
    pub criteria: String,
    pub last_updated: Option<DateTime<Utc>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /classify
///
/// Returns the positions (as strings) of every bio classified `yes`.
/// Remote failures degrade to keyword-only results; they never fail the request.
pub async fn handle_classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    if request.items.len() > state.config.max_batch_size {
        return Err(AppError::Validation(format!(
            "at most {} bios per request, got {}",
            state.config.max_batch_size,
            request.items.len()
        )));
    }

    let criteria_override = request
        .criteria
        .as_deref()
        .filter(|c| !c.trim().is_empty());
    match criteria_override {
        Some(c) => debug!("Using per-request criteria ({} chars)", c.len()),
        None => debug!("Using stored criteria"),
    }

    let instruction = state.store.instruction_for(criteria_override).await;
    let options = CompletionOptions::from_raw(
        request.model.as_deref(),
        request.reasoning_effort.as_deref(),
        request.verbosity.as_deref(),
    );
    let profiles = Profile::from_positions(request.items);

    let results = state
        .classifier
        .classify(&profiles, &instruction, &options)
        .await;

    Ok(Json(ClassifyResponse { results }))
}

/// GET /prompt
pub async fn handle_get_prompt(State(state): State<AppState>) -> Json<PromptResponse> {
    Json(PromptResponse {
        prompt: state.store.current_instruction().await,
    })
}

/// GET /criteria
pub async fn handle_get_criteria(State(state): State<AppState>) -> Json<CriteriaResponse> {
    Json(CriteriaResponse {
        criteria: state.store.current_criteria().await,
        last_updated: state.store.last_updated().await,
    })
}

/// PUT /prompt
///
/// Replaces only the editable criteria; header and footer stay fixed server-side.
pub async fn handle_update_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptUpdateRequest>,
) -> Json<PromptResponse> {
    info!("Updating classification criteria");
    Json(PromptResponse {
        prompt: state.store.update_criteria(&request.criteria).await,
    })
}

/// POST /prompt/reset
pub async fn handle_reset_prompt(State(state): State<AppState>) -> Json<PromptResponse> {
    info!("Resetting classification criteria to default");
    Json(PromptResponse {
        prompt: state.store.reset_criteria().await,
    })
}
