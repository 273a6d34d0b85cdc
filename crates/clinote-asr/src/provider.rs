//! Whisper ASR provider using whisper-rs

use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use clinote_core::{AudioProcessor, TranscriptResult, TranscriptSegment};

use crate::error::AsrError;
use crate::languages::{Language, AUTO_DETECT};
use crate::transcriber::Transcriber;

const WHISPER_SAMPLE_RATE: u32 = 16000;

static SPECIAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|]+\|>").expect("special token pattern is valid"));

/// Transcription options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionOptions {
    /// Language code, or "auto" to let whisper detect it
    pub language: String,
    /// Number of threads (0 = whisper default)
    pub threads: u32,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            language: AUTO_DETECT.to_string(),
            threads: 0,
        }
    }
}

/// Transcription progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeProgress {
    /// Progress fraction (0.0 - 1.0)
    pub fraction: f64,
    /// Processed time in seconds
    pub processed_time: f64,
    /// Total audio duration in seconds
    pub total_time: f64,
}

/// Whisper ASR provider
pub struct WhisperProvider {
    context: Option<Arc<Mutex<WhisperContext>>>,
    options: TranscriptionOptions,
}

impl WhisperProvider {
    pub fn new() -> Self {
        Self {
            context: None,
            options: TranscriptionOptions::default(),
        }
    }

    /// Options used by [`Transcriber::transcribe_file`]
    pub fn with_options(mut self, options: TranscriptionOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a ggml Whisper model from file
    pub async fn load_model(&mut self, model_path: &str) -> Result<(), AsrError> {
        info!("Loading Whisper model from: {}", model_path);

        if !Path::new(model_path).exists() {
            return Err(AsrError::FileNotFound(model_path.to_string()));
        }

        let path = model_path.to_string();
        let context = tokio::task::spawn_blocking(move || {
            WhisperContext::new_with_params(&path, WhisperContextParameters::default())
        })
        .await
        .map_err(|e| AsrError::ModelLoadFailed(e.to_string()))?
        .map_err(|e| AsrError::ModelLoadFailed(e.to_string()))?;

        self.context = Some(Arc::new(Mutex::new(context)));

        info!("Whisper model loaded successfully");
        Ok(())
    }

    /// Transcribe an audio file into segments
    pub async fn transcribe<F>(
        &self,
        audio_path: &Path,
        options: TranscriptionOptions,
        progress_callback: F,
    ) -> Result<TranscriptResult, AsrError>
    where
        F: Fn(TranscribeProgress) + Send + 'static,
    {
        let context = self.context.as_ref().ok_or(AsrError::ModelNotLoaded)?.clone();

        if !Language::is_supported(&options.language) {
            return Err(AsrError::UnsupportedLanguage(options.language.clone()));
        }

        if !audio_path.exists() {
            return Err(AsrError::FileNotFound(audio_path.display().to_string()));
        }

        info!("Starting transcription: {}", audio_path.display());
        debug!("Options: {:?}", options);

        let path = audio_path.to_path_buf();
        let audio = tokio::task::spawn_blocking(move || {
            AudioProcessor::new(WHISPER_SAMPLE_RATE).load(&path)
        })
        .await
        .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))??;

        let total_duration = audio.duration();
        let whisper_lang = Language::to_whisper_code(&options.language);

        let result = tokio::task::spawn_blocking(move || {
            let ctx = context.blocking_lock();

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_language(Some(whisper_lang));
            params.set_token_timestamps(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);

            if options.threads > 0 {
                params.set_n_threads(options.threads as i32);
            }

            let mut state = ctx
                .create_state()
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

            state
                .full(params, &audio.samples)
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

            let language = if whisper_lang == AUTO_DETECT {
                state
                    .full_lang_id_from_state()
                    .ok()
                    .and_then(whisper_rs::get_lang_str)
                    .unwrap_or("en")
                    .to_string()
            } else {
                options.language.clone()
            };

            let num_segments = state
                .full_n_segments()
                .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

            let mut segments = Vec::new();

            for i in 0..num_segments {
                let text = state
                    .full_get_segment_text(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

                // whisper timestamps are in centiseconds
                let start = state
                    .full_get_segment_t0(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))? as f64
                    / 100.0;
                let end = state
                    .full_get_segment_t1(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))? as f64
                    / 100.0;

                let num_tokens = state
                    .full_n_tokens(i)
                    .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;

                let mut probabilities = Vec::new();
                for j in 0..num_tokens {
                    let token_text = state
                        .full_get_token_text(i, j)
                        .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;
                    if is_special_token(&token_text) {
                        continue;
                    }
                    let token_data = state
                        .full_get_token_data(i, j)
                        .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))?;
                    probabilities.push(token_data.p as f64);
                }

                let clean_text = clean_whisper_text(&text);
                if clean_text.is_empty() {
                    continue;
                }

                segments.push(TranscriptSegment::new(
                    start,
                    end.max(start),
                    clean_text,
                    mean(&probabilities),
                ));

                progress_callback(TranscribeProgress {
                    fraction: ((i as f64 + 1.0) / num_segments as f64).min(0.99),
                    processed_time: end,
                    total_time: total_duration,
                });
            }

            progress_callback(TranscribeProgress {
                fraction: 1.0,
                processed_time: total_duration,
                total_time: total_duration,
            });

            Ok::<_, AsrError>(TranscriptResult {
                segments,
                language,
                duration: total_duration,
            })
        })
        .await
        .map_err(|e| AsrError::TranscriptionFailed(e.to_string()))??;

        info!(
            "Transcription completed: {} segments, language {}",
            result.segments.len(),
            result.language
        );
        Ok(result)
    }
}

impl Default for WhisperProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber for WhisperProvider {
    async fn transcribe_file(&self, audio_path: &Path) -> Result<TranscriptResult, AsrError> {
        let options = self.options.clone();
        self.transcribe(audio_path, options, |progress| {
            debug!("Transcription progress: {:.0}%", progress.fraction * 100.0);
        })
        .await
        .inspect_err(|e| warn!("Whisper transcription failed: {}", e))
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}

fn is_special_token(token: &str) -> bool {
    let token = token.trim();
    (token.starts_with('[') && token.ends_with(']'))
        || (token.starts_with("<|") && token.ends_with("|>"))
}

/// Remove `<|...|>` control tokens from whisper output
fn clean_whisper_text(text: &str) -> String {
    SPECIAL_TOKEN.replace_all(text, "").trim().to_string()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_whisper_text() {
        assert_eq!(clean_whisper_text("<|startoftranscript|>Hello"), "Hello");
        assert_eq!(clean_whisper_text("Hello<|endoftext|>"), "Hello");
        assert_eq!(clean_whisper_text("<|en|> How are you? <|endoftext|>"), "How are you?");
    }

    #[test]
    fn test_special_tokens() {
        assert!(is_special_token("[_BEG_]"));
        assert!(is_special_token("<|endoftext|>"));
        assert!(!is_special_token(" hello"));
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[0.5, 1.0]) - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_transcribe_requires_model() {
        let provider = WhisperProvider::new();
        let err = provider.transcribe_file(Path::new("/tmp/none.wav")).await.unwrap_err();
        assert!(matches!(err, AsrError::ModelNotLoaded));
    }
}
