//! Text-safe encoding of audio clips for JSON envelopes.
//!
//! Audio travels inside text frames, so raw bytes are carried as standard
//! padded base64. No compression or resampling happens here.

use crate::error::CodecError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mentor_types::EncodedAudio;

/// Maximum decoded clip size (16 MiB). Larger inbound payloads are rejected
/// before allocation.
const MAX_DECODED_BYTES: usize = 16 * 1024 * 1024;

/// Stateless audio codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioCodec;

impl AudioCodec {
    /// Encodes a captured clip.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Empty`] for a zero-length capture.
    pub fn encode(raw: &[u8]) -> Result<EncodedAudio, CodecError> {
        if raw.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(EncodedAudio::from_encoded(STANDARD.encode(raw)))
    }

    /// Decodes a clip received in an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] when the payload is not valid
    /// base64 (wrong alphabet or bad padding), [`CodecError::TooLarge`]
    /// past the size cap, and [`CodecError::Empty`] when it decodes to
    /// nothing.
    pub fn decode(encoded: &EncodedAudio) -> Result<Vec<u8>, CodecError> {
        Self::decode_str(encoded.as_str())
    }

    /// Like [`AudioCodec::decode`], for a bare string.
    pub fn decode_str(encoded: &str) -> Result<Vec<u8>, CodecError> {
        let trimmed = encoded.trim();
        if trimmed.len() / 4 * 3 > MAX_DECODED_BYTES {
            return Err(CodecError::TooLarge(trimmed.len()));
        }

        let raw = STANDARD.decode(trimmed)?;
        if raw.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_standard_alphabet() {
        let encoded = AudioCodec::encode(&[0xfb, 0xff, 0x00]).unwrap();
        assert_eq!(encoded.as_str(), "+/8A");

        let encoded = AudioCodec::encode(&[0xfb, 0xff, 0xc0]).unwrap();
        assert_eq!(encoded.as_str(), "+//A");
    }

    #[test]
    fn empty_capture_is_rejected() {
        assert!(matches!(AudioCodec::encode(&[]), Err(CodecError::Empty)));
    }

    #[test]
    fn url_safe_alphabet_is_malformed() {
        let result = AudioCodec::decode_str("-__A");
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn empty_payload_decodes_to_error() {
        assert!(matches!(AudioCodec::decode_str(""), Err(CodecError::Empty)));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let raw = AudioCodec::decode_str("  SUQz\n").unwrap();
        assert_eq!(raw, b"ID3");
    }
}
