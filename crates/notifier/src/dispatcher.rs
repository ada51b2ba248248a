use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Why a message could not be delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the message with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Dispatch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Dispatcher not configured: {0}")]
    NotConfigured(String),
}

/// Delivers a rendered notification to its recipient.
///
/// Implementations make a single attempt. Retrying is the worker's job.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, message: &str) -> Result<(), DispatchError>;
}
