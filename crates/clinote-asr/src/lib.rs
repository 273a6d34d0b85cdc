//! Speech-to-text for clinote using whisper-rs
//!
//! The pipeline only sees the [`Transcriber`] trait; [`WhisperProvider`]
//! is the local implementation.

pub mod error;
pub mod languages;
pub mod provider;
pub mod transcriber;

pub use error::AsrError;
pub use languages::{Language, SUPPORTED_LANGUAGES};
pub use provider::{TranscribeProgress, TranscriptionOptions, WhisperProvider};
pub use transcriber::{LocalTranscriber, Transcriber};

pub use clinote_core::{TranscriptResult, TranscriptSegment};
