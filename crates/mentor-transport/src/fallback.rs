//! One-shot request/response channel used while the socket is unavailable.

use crate::error::RequestError;
use async_trait::async_trait;
use mentor_types::{ConversationIdentity, Envelope, EnvelopeKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for one fallback request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless request/response call. No ordering guarantee relative to the
/// persistent channel.
#[async_trait]
pub trait FallbackChannel: Send + Sync {
    async fn request(&self, envelope: &Envelope) -> Result<Envelope, RequestError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    content: &'a str,
    user_id: &'a ConversationIdentity,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Fallback over the endpoint's `POST /chat/` route. Text only.
#[derive(Debug, Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpFallback {
    /// # Errors
    ///
    /// Returns [`RequestError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            chat_url: format!("{}/chat/", base_url.trim_end_matches('/')),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

#[async_trait]
impl FallbackChannel for HttpFallback {
    async fn request(&self, envelope: &Envelope) -> Result<Envelope, RequestError> {
        if envelope.kind != EnvelopeKind::Text {
            return Err(RequestError::Unsupported(envelope.kind));
        }

        let body = ChatRequest {
            content: &envelope.content,
            user_id: &envelope.identity,
        };

        tracing::debug!(url = %self.chat_url, identity = %envelope.identity, "sending fallback request");
        let resp = self.client.post(&self.chat_url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(url = %self.chat_url, status = %status, "fallback endpoint returned error");
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let reply: ChatResponse =
            serde_json::from_str(&text).map_err(|e| RequestError::Decode(e.to_string()))?;

        Ok(Envelope::text_response(
            envelope.identity.clone(),
            reply.response,
        ))
    }
}
