//! Voice handling for the Strike Mentor client.
//!
//! Spoken messages travel inside JSON envelopes, so captured audio is
//! converted to a text-safe encoding before sending and back to raw bytes
//! when a reply is played. Decoding is lazy: a voice reply stays encoded in
//! the transcript until someone asks to hear it.
//!
//! Hardware access is behind the [`AudioRecorder`] and [`AudioPlayer`]
//! traits; this crate only ships file-backed implementations.

pub mod codec;
pub mod device;
pub mod error;

pub use codec::AudioCodec;
pub use device::{AudioPlayer, AudioRecorder, FilePlayer, FileRecorder};
pub use error::{CodecError, VoiceError};
