//! Read-only view of the notification queue.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use binwatch_common::error::AppError;
use binwatch_common::types::NotificationTask;

use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}", get(get_notification))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// A task plus whether its retry budget is spent.
#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub task: NotificationTask,
    pub exhausted: bool,
}

impl NotificationView {
    fn new(task: NotificationTask, max_retries: i32) -> Self {
        let exhausted = task.is_exhausted(max_retries);
        Self { task, exhausted }
    }
}

/// GET /api/notifications — Most recent tasks first.
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let max_retries = state.config.worker_max_retries;
    let tasks = state.store.list_recent(limit).await?;
    Ok(Json(
        tasks
            .into_iter()
            .map(|t| NotificationView::new(t, max_retries))
            .collect(),
    ))
}

/// GET /api/notifications/:id — A single task.
async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationView>, AppError> {
    let task = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

    Ok(Json(NotificationView::new(
        task,
        state.config.worker_max_retries,
    )))
}
