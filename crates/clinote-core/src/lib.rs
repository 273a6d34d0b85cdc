//! clinote-core - session data model for diarized clinical transcripts
//!
//! Holds the segment store, speaker statistics, audio decoding and
//! session export shared by every other clinote crate.

pub mod audio;
pub mod error;
pub mod exporter;
pub mod stats;
pub mod store;
pub mod types;

pub use audio::{AudioData, AudioError, AudioProcessor};
pub use error::CoreError;
pub use exporter::{ExportError, ExportPaths, Exporter};
pub use stats::{compute_speaker_stats, known_speakers};
pub use store::SegmentStore;
pub use types::*;
