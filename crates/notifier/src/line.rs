//! LINE Messaging API push delivery.

use async_trait::async_trait;
use serde::Serialize;

use binwatch_common::config::AppConfig;

use crate::dispatcher::{DispatchError, Dispatcher};

/// Push request body: `{"to": ..., "messages": [{"type": "text", "text": ...}]}`.
#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Sends each message as a text push to a single LINE user or group.
#[derive(Debug, Clone)]
pub struct LinePushDispatcher {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    target_id: String,
}

impl LinePushDispatcher {
    pub fn new(api_url: String, access_token: String, target_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            access_token,
            target_id,
        }
    }

    /// Build a dispatcher from the LINE settings in `config`.
    ///
    /// Fails when the access token or the target ID is missing.
    pub fn from_config(config: &AppConfig) -> Result<Self, DispatchError> {
        let access_token = config.line_channel_access_token.clone().ok_or_else(|| {
            DispatchError::NotConfigured("LINE_CHANNEL_ACCESS_TOKEN is not set".to_string())
        })?;
        let target_id = config.line_target_id.clone().ok_or_else(|| {
            DispatchError::NotConfigured("LINE_TARGET_ID is not set".to_string())
        })?;

        Ok(Self::new(config.line_api_url.clone(), access_token, target_id))
    }
}

#[async_trait]
impl Dispatcher for LinePushDispatcher {
    async fn dispatch(&self, message: &str) -> Result<(), DispatchError> {
        let body = PushRequest {
            to: &self.target_id,
            messages: [TextMessage {
                kind: "text",
                text: message,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "LINE API rejected push message"
            );
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(target_id = %self.target_id, "LINE push message accepted");
        Ok(())
    }
}
