//! Diarization strategy selection with fallback

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clinote_core::{DiarizationMethod, DiarizationTurn};

use crate::error::DiarizationError;
use crate::pause::PauseDiarizer;

/// Model-backed diarization.
///
/// Implement [`NeuralDiarizer`]; `LocalNeuralDiarizer` is derived from it.
#[trait_variant::make(NeuralDiarizer: Send)]
pub trait LocalNeuralDiarizer {
    /// Diarize one audio file
    async fn diarize_file(&self, audio_path: &Path) -> Result<Vec<DiarizationTurn>, DiarizationError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Requested diarization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiarizationMode {
    /// Pause-based only
    Simple,
    /// Neural, falling back to pause-based on failure
    Neural,
    /// Neural when available, else pause-based
    #[default]
    Auto,
}

impl fmt::Display for DiarizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiarizationMode::Simple => write!(f, "simple"),
            DiarizationMode::Neural => write!(f, "neural"),
            DiarizationMode::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for DiarizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(DiarizationMode::Simple),
            "neural" | "advanced" => Ok(DiarizationMode::Neural),
            "auto" => Ok(DiarizationMode::Auto),
            other => Err(format!("unknown diarization mode: {}", other)),
        }
    }
}

/// One of the two interchangeable diarization strategies
pub enum DiarizationStrategy<'a, N> {
    PauseBased(&'a PauseDiarizer),
    NeuralModel(&'a N),
}

impl<N: NeuralDiarizer> DiarizationStrategy<'_, N> {
    pub fn method(&self) -> DiarizationMethod {
        match self {
            DiarizationStrategy::PauseBased(_) => DiarizationMethod::Simple,
            DiarizationStrategy::NeuralModel(_) => DiarizationMethod::Neural,
        }
    }

    pub async fn run(&self, audio_path: &Path) -> Result<Vec<DiarizationTurn>, DiarizationError> {
        match self {
            DiarizationStrategy::PauseBased(pause) => pause.diarize(audio_path).await,
            DiarizationStrategy::NeuralModel(neural) => neural.diarize_file(audio_path).await,
        }
    }
}

/// Turns plus the method that actually produced them
#[derive(Debug, Clone)]
pub struct DiarizationOutcome {
    pub turns: Vec<DiarizationTurn>,
    pub method: DiarizationMethod,
    /// Why the neural strategy was abandoned, if it was
    pub fallback_reason: Option<String>,
}

/// Picks a strategy per session.
///
/// A neural failure of any kind falls back to the pause-based strategy and
/// is recorded in the outcome. Only a pause-based failure is returned as an
/// error. An empty turn list is a valid result of either strategy.
pub struct DiarizationSelector<N> {
    pause: PauseDiarizer,
    neural: Option<N>,
}

impl<N: NeuralDiarizer> DiarizationSelector<N> {
    pub fn new(pause: PauseDiarizer, neural: Option<N>) -> Self {
        Self { pause, neural }
    }

    pub fn has_neural(&self) -> bool {
        self.neural.is_some()
    }

    pub async fn diarize(
        &self,
        audio_path: &Path,
        mode: DiarizationMode,
    ) -> Result<DiarizationOutcome, DiarizationError> {
        if mode == DiarizationMode::Simple {
            return self.run_pause_based(audio_path, None).await;
        }

        let Some(neural) = self.neural.as_ref() else {
            let reason = DiarizationError::ModelNotLoaded.to_string();
            if mode == DiarizationMode::Neural {
                warn!("Neural diarization requested but unavailable: {}", reason);
            } else {
                info!("No neural diarizer configured, using pause-based diarization");
            }
            return self.run_pause_based(audio_path, Some(reason)).await;
        };

        let strategy = DiarizationStrategy::NeuralModel(neural);
        match strategy.run(audio_path).await {
            Ok(turns) => Ok(DiarizationOutcome {
                turns: drop_malformed(turns, neural.name()),
                method: strategy.method(),
                fallback_reason: None,
            }),
            Err(e) => {
                warn!(
                    "Neural diarization ({}) failed, falling back to pause-based: {}",
                    neural.name(),
                    e
                );
                self.run_pause_based(audio_path, Some(e.to_string())).await
            }
        }
    }

    async fn run_pause_based(
        &self,
        audio_path: &Path,
        fallback_reason: Option<String>,
    ) -> Result<DiarizationOutcome, DiarizationError> {
        let strategy = DiarizationStrategy::<N>::PauseBased(&self.pause);
        let turns = strategy.run(audio_path).await?;
        Ok(DiarizationOutcome {
            turns,
            method: strategy.method(),
            fallback_reason,
        })
    }
}

/// Remove turns with non-finite or inverted bounds
fn drop_malformed(turns: Vec<DiarizationTurn>, backend: &str) -> Vec<DiarizationTurn> {
    let total = turns.len();
    let kept: Vec<DiarizationTurn> = turns.into_iter().filter(|t| t.is_well_formed()).collect();
    if kept.len() < total {
        warn!(
            "Dropped {} malformed turns from neural diarization ({})",
            total - kept.len(),
            backend
        );
    }
    kept
}
