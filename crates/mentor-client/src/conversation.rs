//! The conversation client: send policy, inbound classification, and the
//! transcript it publishes.

use crate::error::ClientError;
use crate::transcript::Transcript;
use mentor_transport::{FallbackChannel, HandlerId, TransportChannel};
use mentor_types::{
    ChannelState, Connectivity, ConversationIdentity, Envelope, Inbound, TranscriptEntry,
};
use mentor_voice::{AudioCodec, AudioPlayer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Display text of the user's own voice messages.
pub const VOICE_MESSAGE_LABEL: &str = "Voice message";

/// Display text of a voice reply that came without any text.
pub const VOICE_REPLY_LABEL: &str = "Voice reply";

pub const REQUEST_FAILED_TEXT: &str =
    "Sorry, I'm having trouble processing your request right now.";
pub const VOICE_NEEDS_LIVE_TEXT: &str = "Voice messages need a live connection to the mentor.";
pub const ENCODE_FAILED_TEXT: &str = "Could not encode the voice message.";
pub const PLAYBACK_FAILED_TEXT: &str = "Could not play this voice reply.";
pub const DELIVERY_FAILED_TEXT: &str =
    "Message could not be delivered; switching to offline mode.";

/// What the user asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Text(String),
    /// Raw bytes of one capture session.
    Voice(Vec<u8>),
}

/// One conversation with the mentor.
///
/// Owns the persistent channel and the fallback for the conversation's
/// lifetime. Prefers the persistent channel; without it, text goes through
/// one-shot requests and voice is refused.
///
/// Every accepted send appends exactly one optimistic user entry before the
/// outcome is known. Failures never remove it; they append an
/// assistant-side error entry instead.
pub struct ConversationClient<T, F> {
    identity: ConversationIdentity,
    transport: T,
    fallback: F,
    transcript: Transcript,
    live: AtomicBool,
    shut_down: AtomicBool,
    handler: Mutex<Option<HandlerId>>,
}

impl<T, F> ConversationClient<T, F>
where
    T: TransportChannel,
    F: FallbackChannel,
{
    pub fn new(identity: ConversationIdentity, transport: T, fallback: F) -> Self {
        Self {
            identity,
            transport,
            fallback,
            transcript: Transcript::new(),
            live: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            handler: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> &ConversationIdentity {
        &self.identity
    }

    /// Opens the persistent channel.
    ///
    /// Never fails: a refused or broken handshake leaves the conversation
    /// degraded. There is no automatic retry. A handshake that completes
    /// after [`shutdown`](Self::shutdown) is discarded.
    pub async fn start(&self) -> Connectivity {
        if self.shut_down.load(Ordering::SeqCst) {
            return Connectivity::Degraded;
        }

        {
            let mut handler = self.handler.lock().unwrap_or_else(|e| e.into_inner());
            if handler.is_some() {
                return self.connectivity();
            }
            // Registered before connecting so nothing pushed right after the
            // handshake is missed.
            let transcript = self.transcript.clone();
            *handler = Some(
                self.transport
                    .on_message(Box::new(move |envelope| record_inbound(&transcript, envelope))),
            );
        }

        match self.transport.connect(&self.identity).await {
            Ok(()) if self.shut_down.load(Ordering::SeqCst) => {
                tracing::info!(
                    identity = %self.identity,
                    "channel opened after shutdown; discarding it"
                );
                self.transport.disconnect();
                Connectivity::Degraded
            }
            Ok(()) => {
                self.live.store(true, Ordering::SeqCst);
                tracing::info!(identity = %self.identity, "conversation is live");
                Connectivity::Live
            }
            Err(e) => {
                tracing::warn!(
                    identity = %self.identity,
                    error = %e,
                    "persistent channel unavailable; using request/response fallback"
                );
                Connectivity::Degraded
            }
        }
    }

    /// `Live` while the persistent channel is open and has not failed a send.
    pub fn connectivity(&self) -> Connectivity {
        if self.live.load(Ordering::SeqCst) && self.transport.state() == ChannelState::Open {
            Connectivity::Live
        } else {
            Connectivity::Degraded
        }
    }

    pub async fn send(&self, input: UserInput) -> Result<(), ClientError> {
        match input {
            UserInput::Text(text) => self.send_text(&text).await,
            UserInput::Voice(capture) => self.send_voice(&capture).await,
        }
    }

    /// Sends a text message. Surrounding whitespace is trimmed; blank text
    /// is rejected without touching the transcript.
    pub async fn send_text(&self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        self.transcript.append(TranscriptEntry::user_text(text));
        self.dispatch(Envelope::text(self.identity.clone(), text))
            .await
    }

    /// Sends one voice capture.
    pub async fn send_voice(&self, capture: &[u8]) -> Result<(), ClientError> {
        let encoded = AudioCodec::encode(capture);
        self.transcript.append(TranscriptEntry::user_voice(
            VOICE_MESSAGE_LABEL,
            encoded.as_ref().ok().cloned(),
        ));

        let audio = match encoded {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "voice capture could not be encoded");
                self.append_error(ENCODE_FAILED_TEXT);
                return Err(e.into());
            }
        };

        if self.connectivity() == Connectivity::Degraded {
            tracing::warn!(identity = %self.identity, "voice send refused in degraded mode");
            self.append_error(VOICE_NEEDS_LIVE_TEXT);
            return Err(ClientError::DegradedModeUnsupported);
        }

        self.dispatch(Envelope::voice(self.identity.clone(), audio))
            .await
    }

    /// Routes an outbound envelope. A live send returns as soon as the
    /// envelope is queued; a fallback send returns after its reply has been
    /// recorded.
    async fn dispatch(&self, envelope: Envelope) -> Result<(), ClientError> {
        if self.connectivity() == Connectivity::Live {
            let kind = envelope.kind;
            return match self.transport.send(envelope) {
                Ok(()) => {
                    tracing::debug!(kind = kind.label(), "sent over persistent channel");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "persistent send failed; degrading");
                    self.live.store(false, Ordering::SeqCst);
                    self.append_error(DELIVERY_FAILED_TEXT);
                    Err(e.into())
                }
            };
        }

        match self.fallback.request(&envelope).await {
            Ok(reply) => {
                self.receive(reply);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(identity = %self.identity, error = %e, "fallback request failed");
                self.append_error(REQUEST_FAILED_TEXT);
                Err(e.into())
            }
        }
    }

    /// Records one server-originated envelope.
    pub fn receive(&self, envelope: Envelope) {
        record_inbound(&self.transcript, envelope);
    }

    /// Decodes the audio of entry `index` and hands it to `player`.
    ///
    /// A payload that fails to decode is reported in the transcript; the
    /// entry itself is left as it was.
    pub async fn play(&self, index: usize, player: &dyn AudioPlayer) -> Result<(), ClientError> {
        let entry = self
            .transcript
            .get(index)
            .ok_or(ClientError::EntryNotFound(index))?;
        let audio = entry.audio.as_ref().ok_or(ClientError::NoAudio(index))?;

        let raw = match AudioCodec::decode(audio) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(index, error = %e, "voice payload could not be decoded");
                self.append_error(PLAYBACK_FAILED_TEXT);
                return Err(e.into());
            }
        };

        player.play(&raw).await.map_err(ClientError::Playback)
    }

    /// Ends the conversation. Idempotent. Nothing queued is flushed.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.live.store(false, Ordering::SeqCst);

        let handler = self
            .handler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(id) = handler {
            self.transport.remove_handler(id);
        }
        self.transport.disconnect();

        tracing::info!(identity = %self.identity, "conversation ended");
    }

    /// Copy of the transcript.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.snapshot()
    }

    pub fn transcript_len(&self) -> usize {
        self.transcript.len()
    }

    /// Receives every entry appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEntry> {
        self.transcript.subscribe()
    }

    fn append_error(&self, text: &str) {
        self.transcript.append(TranscriptEntry::assistant_text(text));
    }
}

/// Classifies an inbound envelope and appends the matching entry.
fn record_inbound(transcript: &Transcript, envelope: Envelope) {
    let entry = match envelope.classify() {
        Inbound::TextResponse { text } => TranscriptEntry::assistant_text(text),
        Inbound::VoiceResponse { text, audio } => TranscriptEntry::assistant_voice(
            text.unwrap_or_else(|| VOICE_REPLY_LABEL.to_string()),
            audio,
        ),
        Inbound::TranscribedText { text } => TranscriptEntry::user_voice(text, None),
        Inbound::Error { message } => {
            tracing::warn!(message = %message, "mentor reported an error");
            if message.trim().is_empty() {
                TranscriptEntry::assistant_text(REQUEST_FAILED_TEXT)
            } else {
                TranscriptEntry::assistant_text(message)
            }
        }
        Inbound::Unknown { kind } => {
            tracing::warn!(kind = kind.label(), "ignoring envelope of unexpected kind");
            return;
        }
    };
    transcript.append(entry);
}
