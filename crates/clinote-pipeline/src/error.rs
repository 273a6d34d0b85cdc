//! Pipeline error types

use std::path::PathBuf;

use clinote_asr::AsrError;
use clinote_core::CoreError;
use clinote_diarization::DiarizationError;
use thiserror::Error;

/// Errors that abort a session.
///
/// Neural diarization and contextual role failures are absorbed by their
/// fallbacks and never surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio file not found: {}", .0.display())]
    AudioNotFound(PathBuf),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] AsrError),

    /// The pause-based strategy could not run, i.e. the audio is unreadable
    #[error("Diarization failed: {0}")]
    Diarization(#[from] DiarizationError),

    #[error("Invalid session data: {0}")]
    InvalidSession(#[from] CoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
