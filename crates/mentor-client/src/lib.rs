//! Duplex conversation client for the Strike Mentor coaching assistant.
//!
//! [`ConversationClient`] keeps one persistent channel to the mentor open
//! for the life of a conversation, sends text and voice over it, and
//! records everything that comes back in an append-only [`Transcript`].
//! When the persistent channel is unavailable it falls back to one-shot
//! requests for text.

pub mod config;
pub mod conversation;
pub mod error;
pub mod repl;
pub mod transcript;


pub use conversation::{
    ConversationClient, UserInput, DELIVERY_FAILED_TEXT, ENCODE_FAILED_TEXT,
    PLAYBACK_FAILED_TEXT, REQUEST_FAILED_TEXT, VOICE_MESSAGE_LABEL, VOICE_NEEDS_LIVE_TEXT,
    VOICE_REPLY_LABEL,
};
pub use error::ClientError;
pub use transcript::Transcript;
