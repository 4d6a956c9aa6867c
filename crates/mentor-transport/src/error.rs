//! Error types for the conversation channels.

use mentor_types::{ChannelState, EnvelopeKind};
use thiserror::Error;

/// Errors raised by a persistent transport channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handshake failed, was refused, timed out, or was cancelled.
    #[error("connect failed: {0}")]
    Connect(String),

    /// A send was attempted while the channel was not open.
    #[error("channel is not open (state: {0})")]
    NotConnected(ChannelState),

    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the one-shot fallback channel.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fallback endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected fallback response: {0}")]
    Decode(String),

    #[error("fallback endpoint does not accept {} envelopes", .0.label())]
    Unsupported(EnvelopeKind),
}
