//! Audio capture and playback collaborators.
//!
//! The conversation core never touches audio hardware. It takes raw bytes
//! from an [`AudioRecorder`] and hands decoded clips to an [`AudioPlayer`].
//! The file-backed implementations here stand in for a microphone and a
//! speaker in the terminal client and in tests.

use crate::error::VoiceError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Maximum capture size accepted from a recorder (10 MiB).
const MAX_CAPTURE_BYTES: u64 = 10 * 1024 * 1024;

/// Yields the raw bytes of one recording session.
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    async fn record(&self) -> Result<Vec<u8>, VoiceError>;
}

/// Plays one decoded clip.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, raw: &[u8]) -> Result<(), VoiceError>;
}

/// Reads a previously captured clip from disk.
#[derive(Debug, Clone)]
pub struct FileRecorder {
    path: PathBuf,
}

impl FileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AudioRecorder for FileRecorder {
    async fn record(&self) -> Result<Vec<u8>, VoiceError> {
        let size = tokio::fs::metadata(&self.path).await?.len();
        if size > MAX_CAPTURE_BYTES {
            return Err(VoiceError::Recording(format!(
                "capture exceeds maximum size: {} bytes (limit: {} bytes)",
                size, MAX_CAPTURE_BYTES
            )));
        }

        let raw = tokio::fs::read(&self.path).await?;
        info!(path = %self.path.display(), bytes = raw.len(), "captured audio from file");
        Ok(raw)
    }
}

/// Writes every played clip to a numbered file in an output directory.
///
/// The assistant's speech is MP3, so clips are written as `reply-N.mp3`.
#[derive(Debug)]
pub struct FilePlayer {
    output_dir: PathBuf,
    played: AtomicUsize,
}

impl FilePlayer {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            played: AtomicUsize::new(0),
        }
    }

    /// Number of clips written so far.
    pub fn played(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl AudioPlayer for FilePlayer {
    async fn play(&self, raw: &[u8]) -> Result<(), VoiceError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let n = self.played.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.output_dir.join(format!("reply-{}.mp3", n));
        tokio::fs::write(&path, raw).await?;

        info!(path = %path.display(), bytes = raw.len(), "wrote voice reply");
        Ok(())
    }
}
