//! Session pipeline controller

use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use clinote_asr::Transcriber;
use clinote_core::{
    compute_speaker_stats, known_speakers, SegmentStore, SessionMetadata, SessionResult,
};
use clinote_diarization::{
    align_segments, DiarizationMode, DiarizationSelector, NeuralDiarizer, PauseDiarizer,
};
use clinote_llm::LlmProvider;
use clinote_roles::RoleResolver;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Transcribes, diarizes, aligns and resolves roles for audio sessions.
///
/// Sessions share no mutable state, so one pipeline can serve many at once.
pub struct SessionPipeline<T, N, P> {
    transcriber: T,
    diarizer: DiarizationSelector<N>,
    roles: RoleResolver<P>,
    mode: DiarizationMode,
}

impl<T, N, P> SessionPipeline<T, N, P>
where
    T: Transcriber,
    N: NeuralDiarizer,
    P: LlmProvider,
{
    pub fn new(config: &PipelineConfig, transcriber: T, neural: Option<N>, llm: Option<P>) -> Self {
        let diarizer = DiarizationSelector::new(PauseDiarizer::new(config.pause.clone()), neural);
        if config.diarization_mode != DiarizationMode::Simple && !diarizer.has_neural() {
            info!("No neural diarizer loaded, sessions will use pause-based diarization");
        }

        Self {
            transcriber,
            diarizer,
            roles: RoleResolver::new(config.roles.clone(), llm),
            mode: config.diarization_mode,
        }
    }

    /// Process one audio file.
    ///
    /// Fails only when the audio is missing or unreadable, or when
    /// transcription fails. Every degraded stage is reported in the
    /// result metadata instead.
    pub async fn process(&self, audio_path: &Path) -> Result<SessionResult, PipelineError> {
        if !audio_path.exists() {
            return Err(PipelineError::AudioNotFound(audio_path.to_path_buf()));
        }

        info!(
            "Processing session {} (transcriber: {}, diarization: {})",
            audio_path.display(),
            self.transcriber.name(),
            self.mode
        );

        let (transcript, diarization) = tokio::join!(
            self.transcriber.transcribe_file(audio_path),
            self.diarizer.diarize(audio_path, self.mode)
        );
        let transcript = transcript?;
        let diarization = diarization?;

        let language = transcript.language;
        let duration = transcript.duration;
        let store = SegmentStore::new(transcript.segments, diarization.turns)?;

        if store.turns().is_empty() {
            warn!("No speaker turns detected, all segments will be unknown");
        }

        let aligned = align_segments(store.transcript(), store.turns());
        let stats = compute_speaker_stats(&aligned);
        let resolution = self.roles.resolve(&known_speakers(&stats), &aligned).await;

        info!(
            "Session complete: {} segments, {} speakers, diarization {}, roles {}",
            aligned.len(),
            resolution.assignment.len(),
            diarization.method,
            resolution.method
        );

        Ok(SessionResult {
            audio_path: audio_path.display().to_string(),
            language,
            duration,
            segments: resolution.assignment.apply(&aligned),
            roles: resolution.assignment,
            speakers: stats.into_values().collect(),
            metadata: SessionMetadata {
                diarization_method_used: diarization.method,
                role_resolution_method_used: resolution.method,
                diarization_fallback_reason: diarization.fallback_reason,
                role_resolution_fallback_reason: resolution.fallback_reason,
                processed_at: Utc::now(),
            },
        })
    }

    /// Process many files, at most `concurrency` at a time.
    ///
    /// Results come back in input order; a failed session does not affect
    /// the others.
    pub async fn process_all(
        &self,
        audio_paths: &[PathBuf],
        concurrency: usize,
    ) -> Vec<(PathBuf, Result<SessionResult, PipelineError>)> {
        stream::iter(audio_paths)
            .map(|path| async move { (path.clone(), self.process(path).await) })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
