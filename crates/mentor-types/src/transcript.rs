//! Transcript entry definitions.
//!
//! A transcript is the ordered, append-only record of one conversation as
//! shown to the user. Entries are never edited after they are appended.

use crate::EncodedAudio;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who an entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// How an entry was (or will be) delivered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Text,
    Voice,
}

/// One line of the transcript.
///
/// Voice entries always carry display text. `audio` may be absent on a
/// voice entry (speech recognised, nothing rendered back).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub kind: EntryKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<EncodedAudio>,
    pub received_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(
        speaker: Speaker,
        kind: EntryKind,
        text: impl Into<String>,
        audio: Option<EncodedAudio>,
    ) -> Self {
        Self {
            speaker,
            kind,
            text: text.into(),
            audio,
            received_at: Utc::now(),
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, EntryKind::Text, text, None)
    }

    pub fn user_voice(text: impl Into<String>, audio: Option<EncodedAudio>) -> Self {
        Self::new(Speaker::User, EntryKind::Voice, text, audio)
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, EntryKind::Text, text, None)
    }

    pub fn assistant_voice(text: impl Into<String>, audio: Option<EncodedAudio>) -> Self {
        Self::new(Speaker::Assistant, EntryKind::Voice, text, audio)
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}
