//! Shared types for the Strike Mentor conversation client.
//!
//! This crate provides the foundational types used across all mentor
//! crates: the wire [`Envelope`] exchanged with the conversation endpoint,
//! the [`Inbound`] classification of server-originated envelopes, the
//! append-only [`TranscriptEntry`], and the connection state enums.
//!
//! No crate in the workspace depends on anything *except* `mentor-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

pub mod envelope;
pub mod transcript;

pub use envelope::{Envelope, EnvelopeKind, Inbound};
pub use transcript::{EntryKind, Speaker, TranscriptEntry};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque subject identifier scoping one conversation connection.
///
/// The conversation endpoint historically keys conversations by a numeric
/// user id, so an identity made only of digits is written to the wire as a
/// JSON number. Anything else is written as a string. Both forms are
/// accepted when reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConversationIdentity(String);

impl ConversationIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric form of this identity, if it has one that
    /// round-trips exactly (`"007"` does not).
    fn as_number(&self) -> Option<u64> {
        self.0
            .parse::<u64>()
            .ok()
            .filter(|n| n.to_string() == self.0)
    }
}

impl fmt::Display for ConversationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ConversationIdentity {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ConversationIdentity {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationIdentity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for ConversationIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ConversationIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawIdentity {
            Number(u64),
            Text(String),
        }

        Ok(match RawIdentity::deserialize(deserializer)? {
            RawIdentity::Number(n) => Self::from(n),
            RawIdentity::Text(s) => Self(s),
        })
    }
}

/// Text-safe (base64) representation of a binary audio clip.
///
/// Values are produced by the audio codec or read off the wire; the
/// contents are never interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedAudio(String);

impl EncodedAudio {
    /// Wraps an already-encoded payload.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Lifecycle of one persistent transport channel instance.
///
/// `Connecting -> Open -> Closed`, or `Connecting -> Closed` when the
/// handshake fails. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// Handshake requested but not yet acknowledged.
    Connecting,
    /// Handshake succeeded; sends are accepted.
    Open,
    /// Terminal. A new channel must be constructed to retry.
    Closed,
}

impl ChannelState {
    /// Returns the string label for this state.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Connection health as seen by the conversation client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// The persistent channel is open; replies are pushed.
    Live,
    /// No persistent channel; text goes through one-shot requests.
    Degraded,
}

impl Connectivity {
    /// Returns the string label for this connectivity.
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
