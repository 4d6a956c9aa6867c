use thiserror::Error;

/// Errors produced by the audio codec.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("audio payload is empty")]
    Empty,

    #[error("audio payload is not valid base64: {0}")]
    Malformed(#[from] base64::DecodeError),

    #[error("audio payload too large: {0} encoded bytes")]
    TooLarge(usize),
}

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recording error: {0}")]
    Recording(String),
}
