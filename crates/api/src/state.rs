//! Shared application state for the Axum API server.

use std::sync::Arc;

use binwatch_common::config::AppConfig;
use binwatch_common::error::AppError;
use binwatch_queue::{CollectionSchedule, Enqueuer, TaskStore};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub enqueuer: Enqueuer,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>, config: AppConfig) -> Result<Self, AppError> {
        let schedule = CollectionSchedule::from_config(&config)?;
        let enqueuer = Enqueuer::new(Arc::clone(&store), schedule);

        Ok(Self {
            store,
            enqueuer,
            config,
        })
    }
}
