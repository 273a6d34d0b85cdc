//! Diarization error types

use clinote_core::AudioError;
use thiserror::Error;

/// Diarization-related errors
#[derive(Error, Debug)]
pub enum DiarizationError {
    /// Model not loaded
    #[error("Model not loaded. Please load the diarization models first.")]
    ModelNotLoaded,

    /// Model loading failed
    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),

    /// File not found
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    /// Diarization failed
    #[error("Diarization failed: {0}")]
    DiarizationFailed(String),

    /// Audio could not be decoded
    #[error("Unreadable audio: {0}")]
    UnreadableAudio(#[from] AudioError),
}
