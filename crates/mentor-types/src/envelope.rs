//! Wire envelope exchanged with the conversation endpoint.
//!
//! Every frame on the persistent channel is one JSON object tagged by its
//! `type` field. The field names match what the endpoint emits:
//!
//! ```json
//! {"type": "voice_response", "content": "Peek long", "user_id": 1,
//!  "audio_data": "SUQz...", "text_content": "Peek long"}
//! ```

use crate::{ConversationIdentity, EncodedAudio};
use serde::{Deserialize, Serialize};

/// Kind tag carried in an envelope's `type` field.
///
/// `Text` and `Voice` originate from the client; the rest from the server.
/// Tags this build does not recognise deserialize to `Unknown` instead of
/// failing the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Text,
    Voice,
    TextResponse,
    VoiceResponse,
    TranscribedText,
    Error,
    #[serde(other)]
    Unknown,
}

impl EnvelopeKind {
    /// Whether this kind is produced by the client rather than the server.
    pub fn is_client_originated(self) -> bool {
        matches!(self, Self::Text | Self::Voice)
    }

    /// Returns the wire tag for this kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::TextResponse => "text_response",
            Self::VoiceResponse => "voice_response",
            Self::TranscribedText => "transcribed_text",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// One discrete unit of wire traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "user_id", default)]
    pub identity: ConversationIdentity,
    #[serde(rename = "audio_data", default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<EncodedAudio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl Envelope {
    fn new(kind: EnvelopeKind, identity: ConversationIdentity, content: String) -> Self {
        Self {
            kind,
            content,
            identity,
            audio: None,
            text_content: None,
        }
    }

    /// A client text message.
    pub fn text(identity: ConversationIdentity, content: impl Into<String>) -> Self {
        Self::new(EnvelopeKind::Text, identity, content.into())
    }

    /// A client voice message. The text content is empty; the server
    /// transcribes the audio.
    pub fn voice(identity: ConversationIdentity, audio: EncodedAudio) -> Self {
        Self {
            audio: Some(audio),
            ..Self::new(EnvelopeKind::Voice, identity, String::new())
        }
    }

    pub fn text_response(identity: ConversationIdentity, content: impl Into<String>) -> Self {
        Self::new(EnvelopeKind::TextResponse, identity, content.into())
    }

    pub fn voice_response(
        identity: ConversationIdentity,
        content: impl Into<String>,
        audio: Option<EncodedAudio>,
    ) -> Self {
        let content = content.into();
        Self {
            audio,
            text_content: Some(content.clone()),
            ..Self::new(EnvelopeKind::VoiceResponse, identity, content)
        }
    }

    pub fn transcribed_text(identity: ConversationIdentity, content: impl Into<String>) -> Self {
        Self::new(EnvelopeKind::TranscribedText, identity, content.into())
    }

    pub fn error(identity: ConversationIdentity, message: impl Into<String>) -> Self {
        Self::new(EnvelopeKind::Error, identity, message.into())
    }

    /// Classifies a received envelope into the closed set of server kinds.
    ///
    /// Client kinds arriving inbound are not replies and classify as
    /// [`Inbound::Unknown`] together with unrecognised tags.
    pub fn classify(self) -> Inbound {
        match self.kind {
            EnvelopeKind::TextResponse => Inbound::TextResponse { text: self.content },
            EnvelopeKind::VoiceResponse => {
                let text = non_empty(self.text_content).or_else(|| non_empty(Some(self.content)));
                Inbound::VoiceResponse {
                    text,
                    audio: self.audio,
                }
            }
            EnvelopeKind::TranscribedText => {
                let text = non_empty(Some(self.content))
                    .or_else(|| non_empty(self.text_content))
                    .unwrap_or_default();
                Inbound::TranscribedText { text }
            }
            EnvelopeKind::Error => Inbound::Error {
                message: self.content,
            },
            kind @ (EnvelopeKind::Text | EnvelopeKind::Voice | EnvelopeKind::Unknown) => {
                Inbound::Unknown { kind }
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// A server-originated envelope, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Assistant reply in text.
    TextResponse { text: String },
    /// Assistant reply in speech. `text` is the display text when the
    /// server supplied one; audio stays encoded until played.
    VoiceResponse {
        text: Option<String>,
        audio: Option<EncodedAudio>,
    },
    /// Server transcription of the voice message the user just sent.
    TranscribedText { text: String },
    /// Server-reported failure. Not fatal to the channel.
    Error { message: String },
    /// Anything else, including client kinds echoed back.
    Unknown { kind: EnvelopeKind },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_envelope_matches_wire_shape() {
        let env = Envelope::text(ConversationIdentity::from(1), "Best spots on Dust2");
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({"type": "text", "content": "Best spots on Dust2", "user_id": 1})
        );
    }

    #[test]
    fn voice_envelope_carries_audio_data() {
        let env = Envelope::voice(
            ConversationIdentity::from(1),
            EncodedAudio::from_encoded("AAEC"),
        );
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["type"], "voice");
        assert_eq!(value["content"], "");
        assert_eq!(value["audio_data"], "AAEC");
    }

    #[test]
    fn unrecognised_kind_parses_as_unknown() {
        let env: Envelope =
            serde_json::from_str(r#"{"type": "typing_indicator", "content": "", "user_id": 1}"#)
                .unwrap();
        assert_eq!(env.kind, EnvelopeKind::Unknown);
        assert_eq!(
            env.classify(),
            Inbound::Unknown {
                kind: EnvelopeKind::Unknown
            }
        );
    }

    #[test]
    fn reply_without_user_id_still_parses() {
        let env: Envelope =
            serde_json::from_str(r#"{"type": "text_response", "content": "Peek long"}"#).unwrap();
        assert_eq!(
            env.classify(),
            Inbound::TextResponse {
                text: "Peek long".to_string()
            }
        );
    }

    #[test]
    fn voice_response_prefers_text_content() {
        let env: Envelope = serde_json::from_value(json!({
            "type": "voice_response",
            "content": "raw",
            "user_id": 1,
            "audio_data": "SUQz",
            "text_content": "Smoke xbox from T spawn"
        }))
        .unwrap();

        match env.classify() {
            Inbound::VoiceResponse { text, audio } => {
                assert_eq!(text.as_deref(), Some("Smoke xbox from T spawn"));
                assert_eq!(audio, Some(EncodedAudio::from_encoded("SUQz")));
            }
            other => panic!("expected voice response, got {:?}", other),
        }
    }

    #[test]
    fn voice_response_falls_back_to_content_then_none() {
        let env: Envelope = serde_json::from_value(json!({
            "type": "voice_response", "content": "Hold B site", "user_id": 1
        }))
        .unwrap();
        assert!(matches!(
            env.classify(),
            Inbound::VoiceResponse { text: Some(ref t), audio: None } if t == "Hold B site"
        ));

        let env: Envelope = serde_json::from_value(json!({
            "type": "voice_response", "content": "", "user_id": 1, "audio_data": "SUQz"
        }))
        .unwrap();
        assert!(matches!(
            env.classify(),
            Inbound::VoiceResponse { text: None, audio: Some(_) }
        ));
    }

    #[test]
    fn echoed_client_kind_is_not_a_reply() {
        let env = Envelope::text(ConversationIdentity::from(1), "hi");
        assert_eq!(
            env.classify(),
            Inbound::Unknown {
                kind: EnvelopeKind::Text
            }
        );
    }

    #[test]
    fn client_origin() {
        assert!(EnvelopeKind::Voice.is_client_originated());
        assert!(!EnvelopeKind::TranscribedText.is_client_originated());
        assert_eq!(EnvelopeKind::TranscribedText.label(), "transcribed_text");
    }
}
