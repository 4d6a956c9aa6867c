//! Errors surfaced by the conversation client.
//!
//! Every error returned from a send or playback has already been recorded
//! in the transcript as an assistant-side entry; the `Err` lets callers
//! react as well.

use mentor_transport::{RequestError, TransportError};
use mentor_voice::{CodecError, VoiceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Blank text is not a send; nothing was recorded.
    #[error("message is empty")]
    EmptyMessage,

    /// Voice was sent without a live channel. No network call was made.
    #[error("voice messages are not supported in degraded mode")]
    DegradedModeUnsupported,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("fallback request failed: {0}")]
    Request(#[from] RequestError),

    #[error("audio codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("playback failed: {0}")]
    Playback(VoiceError),

    #[error("no transcript entry at index {0}")]
    EntryNotFound(usize),

    #[error("transcript entry {0} has no audio")]
    NoAudio(usize),
}
