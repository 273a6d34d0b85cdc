//! Contextual role resolution errors

use std::time::Duration;

use clinote_llm::LlmError;
use thiserror::Error;

use crate::contextual::ConfidenceTier;

/// Reasons a contextual classification is discarded.
///
/// None of these abort a session; the heuristic assignment is kept instead.
#[derive(Error, Debug)]
pub enum ContextualError {
    #[error("No language model configured")]
    NoProvider,

    #[error("Language model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Language model request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Reply contains no JSON object")]
    NoJson,

    #[error("Malformed classification: {0}")]
    Malformed(String),

    #[error("Classification names unknown speaker: {0}")]
    UnknownSpeaker(String),

    #[error("Classification uses invalid role: {0}")]
    InvalidRole(String),

    #[error("Classification must name exactly one clinician and one client, got {clinicians} and {clients}")]
    IncompleteAssignment { clinicians: usize, clients: usize },

    #[error("Reported confidence {reported} is below required {required}")]
    LowConfidence {
        reported: ConfidenceTier,
        required: ConfidenceTier,
    },
}
