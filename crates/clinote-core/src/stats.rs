//! Speaker statistics aggregation

use std::collections::BTreeMap;

use crate::types::{AlignedSegment, SpeakerStats, UNKNOWN_SPEAKER};

/// Aggregate per-speaker statistics from aligned segments.
///
/// Pure and deterministic: the same input always yields the same map,
/// keyed and ordered by speaker id. "unknown" is kept as its own entry.
pub fn compute_speaker_stats(aligned: &[AlignedSegment]) -> BTreeMap<String, SpeakerStats> {
    aligned.iter().fold(BTreeMap::new(), |mut acc, a| {
        let stats = acc
            .entry(a.speaker_id.clone())
            .or_insert_with(|| SpeakerStats {
                speaker_id: a.speaker_id.clone(),
                total_duration: 0.0,
                segment_count: 0,
                total_words: 0,
                first_appearance: a.segment.start,
            });

        stats.total_duration += a.segment.duration();
        stats.segment_count += 1;
        stats.total_words += a.segment.word_count();
        stats.first_appearance = stats.first_appearance.min(a.segment.start);
        acc
    })
}

/// Statistics eligible for role ranking ("unknown" removed)
pub fn known_speakers(stats: &BTreeMap<String, SpeakerStats>) -> Vec<SpeakerStats> {
    stats
        .values()
        .filter(|s| s.speaker_id != UNKNOWN_SPEAKER)
        .cloned()
        .collect()
}
