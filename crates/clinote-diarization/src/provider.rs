//! Neural speaker diarization using pyannote-rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use clinote_core::{AudioProcessor, DiarizationTurn};

use crate::error::DiarizationError;
use crate::selector::NeuralDiarizer;

/// pyannote-rs expects 16 kHz input
const PYANNOTE_SAMPLE_RATE: u32 = 16000;

/// Options for the neural strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PyannoteOptions {
    /// Maximum number of speakers (None = unbounded)
    pub max_speakers: Option<usize>,
    /// Cosine similarity above which an embedding joins an existing speaker
    pub similarity_threshold: f32,
}

impl Default for PyannoteOptions {
    fn default() -> Self {
        Self {
            max_speakers: None,
            similarity_threshold: 0.6,
        }
    }
}

/// Speaker diarization backed by the pyannote segmentation and
/// wespeaker embedding ONNX models
pub struct PyannoteDiarizer {
    segmentation_model_path: Option<PathBuf>,
    embedding_model_path: Option<PathBuf>,
    options: PyannoteOptions,
}

impl PyannoteDiarizer {
    pub fn new() -> Self {
        Self {
            segmentation_model_path: None,
            embedding_model_path: None,
            options: PyannoteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PyannoteOptions) -> Self {
        self.options = options;
        self
    }

    /// Register the model files.
    ///
    /// The ONNX sessions themselves are created per diarization run.
    pub fn load_models(
        &mut self,
        segmentation_model_path: &Path,
        embedding_model_path: &Path,
    ) -> Result<(), DiarizationError> {
        for path in [segmentation_model_path, embedding_model_path] {
            if !path.exists() {
                return Err(DiarizationError::FileNotFound(path.display().to_string()));
            }
        }

        self.segmentation_model_path = Some(segmentation_model_path.to_path_buf());
        self.embedding_model_path = Some(embedding_model_path.to_path_buf());

        info!(
            "Diarization models registered: {}, {}",
            segmentation_model_path.display(),
            embedding_model_path.display()
        );
        Ok(())
    }

    /// Run segmentation, embedding and clustering on one file
    pub async fn diarize(&self, audio_path: &Path) -> Result<Vec<DiarizationTurn>, DiarizationError> {
        let segmentation_path = self
            .segmentation_model_path
            .clone()
            .ok_or(DiarizationError::ModelNotLoaded)?;
        let embedding_path = self
            .embedding_model_path
            .clone()
            .ok_or(DiarizationError::ModelNotLoaded)?;

        if !audio_path.exists() {
            return Err(DiarizationError::FileNotFound(audio_path.display().to_string()));
        }

        info!("Starting neural diarization: {}", audio_path.display());
        debug!("Options: {:?}", self.options);

        let path = audio_path.to_path_buf();
        let options = self.options.clone();

        let turns = tokio::task::spawn_blocking(move || {
            use pyannote_rs::{get_segments, EmbeddingExtractor};

            let audio = AudioProcessor::new(PYANNOTE_SAMPLE_RATE).load(&path)?;
            let samples: Vec<i16> = audio
                .samples
                .iter()
                .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .collect();

            let segments_iter = get_segments(&samples, PYANNOTE_SAMPLE_RATE, &segmentation_path)
                .map_err(|e| {
                    DiarizationError::ModelLoadFailed(format!(
                        "Failed to load segmentation model: {}",
                        e
                    ))
                })?;

            let mut vad_segments = Vec::new();
            for segment_result in segments_iter {
                match segment_result {
                    Ok(segment) => vad_segments.push(segment),
                    Err(e) => debug!("Segment processing error: {}", e),
                }
            }

            let mut extractor = EmbeddingExtractor::new(&embedding_path).map_err(|e| {
                DiarizationError::ModelLoadFailed(format!("Failed to load embedding model: {}", e))
            })?;

            let mut speakers: Vec<Vec<f32>> = Vec::new();
            let mut turns = Vec::with_capacity(vad_segments.len());

            for segment in &vad_segments {
                let embedding: Vec<f32> = match extractor.compute(&segment.samples) {
                    Ok(values) => values.collect(),
                    Err(e) => {
                        warn!("Skipping segment at {:.2}s: {}", segment.start, e);
                        continue;
                    }
                };

                let index = find_or_create_speaker(&embedding, &mut speakers, &options);
                turns.push(DiarizationTurn::new(
                    segment.start,
                    segment.end.max(segment.start),
                    speaker_label(index),
                ));
            }

            Ok::<_, DiarizationError>(turns)
        })
        .await
        .map_err(|e| DiarizationError::DiarizationFailed(e.to_string()))??;

        info!("Neural diarization completed: {} turns", turns.len());
        Ok(turns)
    }
}

impl Default for PyannoteDiarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NeuralDiarizer for PyannoteDiarizer {
    async fn diarize_file(&self, audio_path: &Path) -> Result<Vec<DiarizationTurn>, DiarizationError> {
        self.diarize(audio_path).await
    }

    fn name(&self) -> &'static str {
        "pyannote"
    }
}

/// Stable `SPEAKER_NN` label for a cluster index
pub(crate) fn speaker_label(index: usize) -> String {
    format!("SPEAKER_{:02}", index)
}

/// Index of the closest known speaker, or a new one
fn find_or_create_speaker(
    embedding: &[f32],
    speakers: &mut Vec<Vec<f32>>,
    options: &PyannoteOptions,
) -> usize {
    let best = speakers
        .iter()
        .enumerate()
        .map(|(i, known)| (i, cosine_similarity(embedding, known)))
        .max_by(|a, b| a.1.total_cmp(&b.1));

    match best {
        Some((index, similarity)) if similarity > options.similarity_threshold => index,
        // At the speaker limit every embedding joins its closest cluster
        Some((index, _)) if options.max_speakers.is_some_and(|max| speakers.len() >= max) => index,
        _ => {
            speakers.push(embedding.to_vec());
            speakers.len() - 1
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_clustering_reuses_similar_speakers() {
        let options = PyannoteOptions::default();
        let mut speakers = Vec::new();

        assert_eq!(find_or_create_speaker(&[1.0, 0.0], &mut speakers, &options), 0);
        assert_eq!(find_or_create_speaker(&[0.0, 1.0], &mut speakers, &options), 1);
        assert_eq!(find_or_create_speaker(&[0.9, 0.1], &mut speakers, &options), 0);
        assert_eq!(speakers.len(), 2);
    }

    #[test]
    fn test_clustering_respects_max_speakers() {
        let options = PyannoteOptions {
            max_speakers: Some(1),
            ..Default::default()
        };
        let mut speakers = Vec::new();

        assert_eq!(find_or_create_speaker(&[1.0, 0.0], &mut speakers, &options), 0);
        assert_eq!(find_or_create_speaker(&[0.0, 1.0], &mut speakers, &options), 0);
        assert_eq!(speakers.len(), 1);
    }

    #[test]
    fn test_speaker_label() {
        assert_eq!(speaker_label(0), "SPEAKER_00");
        assert_eq!(speaker_label(12), "SPEAKER_12");
    }

    #[tokio::test]
    async fn test_diarize_requires_models() {
        let diarizer = PyannoteDiarizer::new();
        let err = diarizer.diarize(Path::new("/tmp/none.wav")).await.unwrap_err();
        assert!(matches!(err, DiarizationError::ModelNotLoaded));
    }

    #[test]
    fn test_load_models_checks_files() {
        let mut diarizer = PyannoteDiarizer::new();
        let err = diarizer
            .load_models(Path::new("/nonexistent/seg.onnx"), Path::new("/nonexistent/emb.onnx"))
            .unwrap_err();
        assert!(matches!(err, DiarizationError::FileNotFound(_)));
    }
}
