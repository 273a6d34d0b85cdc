//! Transcription engine trait

use std::path::Path;

use clinote_core::TranscriptResult;

use crate::error::AsrError;

/// Speech-to-text engine consumed by the session pipeline
#[trait_variant::make(Transcriber: Send)]
pub trait LocalTranscriber {
    /// Transcribe a whole file into time-ordered segments with a language tag
    async fn transcribe_file(&self, audio_path: &Path) -> Result<TranscriptResult, AsrError>;

    /// Engine name for logs
    fn name(&self) -> &'static str;
}
