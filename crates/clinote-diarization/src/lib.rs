//! Speaker diarization for clinote
//!
//! Two interchangeable strategies produce diarization turns: a pause-based
//! heuristic with no model dependency, and a neural strategy backed by
//! pyannote-rs. [`DiarizationSelector`] picks one per session and falls
//! back to the pause-based strategy when the neural one is unavailable.
//! [`align_segments`] then attributes transcript segments to turns.

pub mod align;
pub mod error;
pub mod pause;
pub mod provider;
pub mod selector;

pub use align::align_segments;
pub use error::DiarizationError;
pub use pause::{PauseDiarizer, PauseOptions};
pub use provider::{PyannoteDiarizer, PyannoteOptions};
pub use selector::{
    DiarizationMode, DiarizationOutcome, DiarizationSelector, DiarizationStrategy,
    LocalNeuralDiarizer, NeuralDiarizer,
};

// Re-export types from clinote-core
pub use clinote_core::{AlignedSegment, DiarizationMethod, DiarizationTurn, TranscriptSegment};
