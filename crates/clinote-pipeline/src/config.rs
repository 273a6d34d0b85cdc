//! Pipeline configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use clinote_asr::TranscriptionOptions;
use clinote_diarization::{DiarizationMode, PauseOptions, PyannoteOptions};
use clinote_llm::OllamaConfig;
use clinote_roles::RoleResolverConfig;

use crate::error::PipelineError;

/// Settings for every stage, loadable from JSON.
///
/// Missing fields take their defaults, so `{}` is a valid file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub diarization_mode: DiarizationMode,
    pub pause: PauseOptions,
    pub neural: PyannoteOptions,
    pub roles: RoleResolverConfig,
    pub transcription: TranscriptionOptions,
    pub ollama: OllamaConfig,
    /// Sessions processed at once in batch mode
    pub max_concurrent_sessions: usize,
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Batch concurrency, at least one
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_sessions.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinote_roles::DominantSpeakerRole;

    #[test]
    fn test_empty_json_is_default() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config.diarization_mode, DiarizationMode::Auto);
        assert_eq!(config.pause, PauseOptions::default());
        assert!(config.roles.contextual_enabled);
        assert_eq!(config.transcription.language, "auto");
        assert_eq!(config.concurrency(), 1);
    }

    #[test]
    fn test_partial_overrides() {
        let config = PipelineConfig::from_json(
            r#"{
                "diarization_mode": "simple",
                "pause": {"turn_change_gap": 1.5},
                "roles": {"contextual_enabled": false, "dominant_speaker_role": "clinician"},
                "max_concurrent_sessions": 4
            }"#,
        )
        .unwrap();

        assert_eq!(config.diarization_mode, DiarizationMode::Simple);
        assert_eq!(config.pause.turn_change_gap, 1.5);
        assert_eq!(config.pause.min_silence, 0.5);
        assert!(!config.roles.contextual_enabled);
        assert_eq!(config.roles.dominant_speaker_role, DominantSpeakerRole::Clinician);
        assert_eq!(config.concurrency(), 4);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinote.json");
        std::fs::write(&path, r#"{"ollama": {"model": "mistral"}}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.ollama.model, "mistral");

        assert!(matches!(
            PipelineConfig::from_file(dir.path().join("missing.json")),
            Err(PipelineError::Config(_))
        ));
        std::fs::write(&path, "not json").unwrap();
        assert!(PipelineConfig::from_file(&path).is_err());
    }
}
