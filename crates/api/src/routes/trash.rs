//! Trigger route for the bin sensor.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use binwatch_common::error::AppError;
use binwatch_queue::TriggerResult;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/trash-full", post(trash_full))
}

/// Response body for a trigger.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: TriggerResult,
}

/// POST /api/trash-full — Queue a notification for the next collection day.
///
/// Any request body is ignored. Repeated triggers before that day report
/// `already_queued` and change nothing.
async fn trash_full(State(state): State<AppState>) -> Result<Json<TriggerResponse>, AppError> {
    let result = state.enqueuer.trigger(Utc::now()).await?;
    Ok(Json(TriggerResponse {
        success: true,
        result,
    }))
}
