//! Per-session segment store

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::types::{DiarizationTurn, TranscriptSegment};

/// Transcript segments and diarization turns for one session.
///
/// Both lists are validated and sorted by start time on construction and
/// are read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    transcript: Vec<TranscriptSegment>,
    turns: Vec<DiarizationTurn>,
}

impl SegmentStore {
    /// Build a store, rejecting malformed intervals
    pub fn new(
        mut transcript: Vec<TranscriptSegment>,
        mut turns: Vec<DiarizationTurn>,
    ) -> Result<Self, CoreError> {
        for segment in &transcript {
            check_interval("transcript", segment.start, segment.end)?;
        }
        for turn in &turns {
            check_interval("turn", turn.start, turn.end)?;
        }

        // Stable sorts keep engine order for equal starts
        transcript.sort_by(|a, b| a.start.total_cmp(&b.start));
        turns.sort_by(|a, b| a.start.total_cmp(&b.start));

        let overlaps = transcript
            .windows(2)
            .filter(|w| w[1].start < w[0].end)
            .count();
        if overlaps > 0 {
            warn!("{} transcript segments overlap their predecessor", overlaps);
        }

        debug!(
            "Segment store: {} transcript segments, {} turns",
            transcript.len(),
            turns.len()
        );

        Ok(Self { transcript, turns })
    }

    pub fn transcript(&self) -> &[TranscriptSegment] {
        &self.transcript
    }

    pub fn turns(&self) -> &[DiarizationTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

fn check_interval(kind: &'static str, start: f64, end: f64) -> Result<(), CoreError> {
    if !start.is_finite() || !end.is_finite() || end < start {
        return Err(CoreError::InvalidInterval { kind, start, end });
    }
    Ok(())
}
