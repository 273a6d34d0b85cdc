//! ASR error types

use clinote_core::AudioError;
use thiserror::Error;

/// ASR-related errors
#[derive(Error, Debug)]
pub enum AsrError {
    /// Model not loaded
    #[error("Model not loaded. Please load a model first.")]
    ModelNotLoaded,

    /// Model loading failed
    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),

    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// File not found
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    /// Transcription failed
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Audio could not be decoded
    #[error("Unreadable audio: {0}")]
    UnreadableAudio(#[from] AudioError),
}
