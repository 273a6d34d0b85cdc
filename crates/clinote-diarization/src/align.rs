//! Attribution of transcript segments to diarization turns

use std::cmp::Ordering;

use clinote_core::{AlignedSegment, DiarizationTurn, TranscriptSegment};

/// Attach a speaker to every transcript segment.
///
/// A segment belongs to the turn containing its midpoint (half-open,
/// `start <= mid < end`). When several turns contain the midpoint the one
/// with the largest intersection wins, then the earliest start. Segments
/// whose midpoint no turn contains are `unknown` with confidence 0.
///
/// Output has the same length and order as `segments`.
pub fn align_segments(
    segments: &[TranscriptSegment],
    turns: &[DiarizationTurn],
) -> Vec<AlignedSegment> {
    segments
        .iter()
        .map(|segment| align_segment(segment, turns))
        .collect()
}

fn align_segment(segment: &TranscriptSegment, turns: &[DiarizationTurn]) -> AlignedSegment {
    let midpoint = segment.midpoint();
    let overlap = |turn: &DiarizationTurn| turn.intersection(segment.start, segment.end);

    // min_by keeps the first of equal candidates, so input order breaks full ties
    let best = turns
        .iter()
        .filter(|turn| turn.contains(midpoint))
        .min_by(|a, b| prefer(overlap(a), a.start, overlap(b), b.start));

    match best {
        Some(turn) => {
            let duration = segment.duration();
            let confidence = if duration > 0.0 {
                (overlap(turn) / duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            AlignedSegment {
                segment: segment.clone(),
                speaker_id: turn.speaker_id.clone(),
                alignment_confidence: confidence,
            }
        }
        None => AlignedSegment::unknown(segment.clone()),
    }
}

/// Larger overlap first, then earlier start
fn prefer(overlap_a: f64, start_a: f64, overlap_b: f64, start_b: f64) -> Ordering {
    overlap_b
        .total_cmp(&overlap_a)
        .then_with(|| start_a.total_cmp(&start_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinote_core::UNKNOWN_SPEAKER;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text, 0.9)
    }

    fn turn(start: f64, end: f64, speaker: &str) -> DiarizationTurn {
        DiarizationTurn::new(start, end, speaker)
    }

    #[test]
    fn test_two_speaker_session() {
        let segments = vec![
            seg(0.0, 10.0, "so what brings you in today"),
            seg(12.0, 28.0, "I have been feeling anxious"),
            seg(31.0, 39.0, "tell me more"),
        ];
        let turns = vec![
            turn(0.0, 11.0, "SPEAKER_00"),
            turn(11.0, 30.0, "SPEAKER_01"),
            turn(30.0, 40.0, "SPEAKER_00"),
        ];

        let aligned = align_segments(&segments, &turns);
        let speakers: Vec<&str> = aligned.iter().map(|a| a.speaker_id.as_str()).collect();
        assert_eq!(speakers, vec!["SPEAKER_00", "SPEAKER_01", "SPEAKER_00"]);
        assert!(aligned.iter().all(|a| a.alignment_confidence == 1.0));
    }

    #[test]
    fn test_preserves_length_and_order() {
        let segments = vec![seg(5.0, 6.0, "b"), seg(1.0, 2.0, "a"), seg(50.0, 51.0, "c")];
        let turns = vec![turn(0.0, 10.0, "A")];

        let aligned = align_segments(&segments, &turns);
        assert_eq!(aligned.len(), segments.len());
        for (a, s) in aligned.iter().zip(&segments) {
            assert_eq!(&a.segment, s);
        }
    }

    #[test]
    fn test_partial_overlap_confidence() {
        // midpoint 5.0 lies in A; A covers 6 of the 10 seconds
        let aligned = align_segments(&[seg(0.0, 10.0, "x")], &[turn(-1.0, 6.0, "A")]);
        assert_eq!(aligned[0].speaker_id, "A");
        assert!((aligned[0].alignment_confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_outside_all_turns_is_unknown() {
        let aligned = align_segments(&[seg(10.0, 12.0, "x")], &[turn(0.0, 10.5, "A")]);
        assert_eq!(aligned[0].speaker_id, UNKNOWN_SPEAKER);
        assert_eq!(aligned[0].alignment_confidence, 0.0);
    }

    #[test]
    fn test_half_open_boundary() {
        // midpoint exactly at a turn's end belongs to the next turn
        let turns = vec![turn(0.0, 5.0, "A"), turn(5.0, 10.0, "B")];
        let aligned = align_segments(&[seg(4.0, 6.0, "x")], &turns);
        assert_eq!(aligned[0].speaker_id, "B");
        assert!((aligned[0].alignment_confidence - 0.5).abs() < 1e-9);

        let aligned = align_segments(&[seg(9.0, 11.0, "x")], &[turn(0.0, 10.0, "A")]);
        assert_eq!(aligned[0].speaker_id, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_overlapping_turns_prefer_larger_intersection() {
        let segments = vec![seg(4.0, 8.0, "x")];
        let turns = vec![turn(0.0, 6.5, "A"), turn(5.0, 12.0, "B")];

        let aligned = align_segments(&segments, &turns);
        assert_eq!(aligned[0].speaker_id, "B");
        assert!((aligned[0].alignment_confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_turns_tie_on_earliest_start() {
        let segments = vec![seg(4.0, 6.0, "x")];
        let turns = vec![turn(3.0, 10.0, "LATE"), turn(0.0, 10.0, "EARLY")];

        let aligned = align_segments(&segments, &turns);
        assert_eq!(aligned[0].speaker_id, "EARLY");
    }

    #[test]
    fn test_zero_length_segment() {
        let aligned = align_segments(&[seg(3.0, 3.0, "hm")], &[turn(0.0, 5.0, "A")]);
        assert_eq!(aligned[0].speaker_id, "A");
        assert_eq!(aligned[0].alignment_confidence, 1.0);
    }

    #[test]
    fn test_zero_length_turn_never_matches() {
        let aligned = align_segments(&[seg(3.0, 3.0, "hm")], &[turn(3.0, 3.0, "A")]);
        assert_eq!(aligned[0].speaker_id, UNKNOWN_SPEAKER);
    }

    #[test]
    fn test_no_turns() {
        let segments = vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b")];
        let aligned = align_segments(&segments, &[]);
        assert!(aligned.iter().all(|a| a.speaker_id == UNKNOWN_SPEAKER));
        assert!(aligned.iter().all(|a| a.alignment_confidence == 0.0));
    }

    #[test]
    fn test_confidence_always_in_unit_range() {
        let segments = vec![
            seg(0.0, 1.0, "a"),
            seg(0.5, 9.0, "b"),
            seg(7.0, 7.0, "c"),
            seg(20.0, 30.0, "d"),
        ];
        let turns = vec![turn(0.0, 2.0, "A"), turn(1.5, 8.0, "B"), turn(6.0, 25.0, "A")];

        for a in align_segments(&segments, &turns) {
            assert!((0.0..=1.0).contains(&a.alignment_confidence));
        }
    }
}
