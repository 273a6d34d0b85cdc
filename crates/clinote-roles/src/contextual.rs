//! Contextual role classification: speaker profiles in, validated
//! assignment out

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use clinote_core::{AlignedSegment, Role, RoleAssignment, SpeakerStats};
use clinote_llm::{extract_json_object, SpeakerProfile};

use crate::error::ContextualError;

/// Confidence the model reports for its own classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Low => write!(f, "low"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::High => write!(f, "high"),
        }
    }
}

impl FromStr for ConfidenceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ConfidenceTier::Low),
            "medium" => Ok(ConfidenceTier::Medium),
            "high" => Ok(ConfidenceTier::High),
            other => Err(format!("unknown confidence tier: {}", other)),
        }
    }
}

/// Parsed model reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoleClassification {
    /// speaker id -> "clinician" | "client"
    pub assignments: BTreeMap<String, String>,
    pub confidence: ConfidenceTier,
}

/// Profiles for `speakers`, in the given order
pub fn build_profiles(
    aligned: &[AlignedSegment],
    speakers: &[&SpeakerStats],
    sample_chars: usize,
) -> Vec<SpeakerProfile> {
    speakers
        .iter()
        .map(|stats| {
            let texts: Vec<&str> = aligned
                .iter()
                .filter(|a| a.speaker_id == stats.speaker_id)
                .map(|a| a.segment.text.trim())
                .collect();
            let combined = texts.join(" ");

            SpeakerProfile {
                speaker_id: stats.speaker_id.clone(),
                segment_count: stats.segment_count,
                total_duration: stats.total_duration,
                total_words: stats.total_words,
                avg_words_per_segment: if stats.segment_count > 0 {
                    stats.total_words as f64 / stats.segment_count as f64
                } else {
                    0.0
                },
                question_count: combined.matches('?').count(),
                sample_text: combined.chars().take(sample_chars).collect(),
            }
        })
        .collect()
}

/// Parse the JSON object embedded in a model reply
pub fn parse_classification(reply: &str) -> Result<RoleClassification, ContextualError> {
    let json = extract_json_object(reply).ok_or(ContextualError::NoJson)?;
    serde_json::from_str(json).map_err(|e| ContextualError::Malformed(e.to_string()))
}

fn parse_primary_role(label: &str) -> Result<Role, ContextualError> {
    match label.trim().to_ascii_lowercase().as_str() {
        "clinician" | "therapist" => Ok(Role::Clinician),
        "client" | "patient" => Ok(Role::Client),
        _ => Err(ContextualError::InvalidRole(label.to_string())),
    }
}

/// Turn a classification into a complete assignment.
///
/// `ranked` is the heuristic ranking of known speakers. The classification
/// must name exactly one Clinician and one Client among them and nothing
/// else. Remaining speakers are numbered from `Speaker_3` in ranked order.
pub fn validate_classification(
    classification: RoleClassification,
    ranked: &[&SpeakerStats],
    min_confidence: Option<ConfidenceTier>,
) -> Result<RoleAssignment, ContextualError> {
    if let Some(required) = min_confidence {
        if classification.confidence < required {
            return Err(ContextualError::LowConfidence {
                reported: classification.confidence,
                required,
            });
        }
    }

    let mut primary: BTreeMap<String, Role> = BTreeMap::new();
    for (speaker_id, label) in &classification.assignments {
        if !ranked.iter().any(|s| &s.speaker_id == speaker_id) {
            return Err(ContextualError::UnknownSpeaker(speaker_id.clone()));
        }
        primary.insert(speaker_id.clone(), parse_primary_role(label)?);
    }

    let clinicians = primary.values().filter(|r| **r == Role::Clinician).count();
    let clients = primary.values().filter(|r| **r == Role::Client).count();
    if clinicians != 1 || clients != 1 {
        return Err(ContextualError::IncompleteAssignment { clinicians, clients });
    }

    let others: Vec<(String, Role)> = ranked
        .iter()
        .filter(|s| !primary.contains_key(&s.speaker_id))
        .enumerate()
        .map(|(i, s)| (s.speaker_id.clone(), Role::Speaker(i + 3)))
        .collect();

    Ok(primary.into_iter().chain(others).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinote_core::TranscriptSegment;

    fn stats(id: &str, duration: f64) -> SpeakerStats {
        SpeakerStats {
            speaker_id: id.to_string(),
            total_duration: duration,
            segment_count: 2,
            total_words: 9,
            first_appearance: 0.0,
        }
    }

    fn aligned(start: f64, end: f64, text: &str, speaker: &str) -> AlignedSegment {
        AlignedSegment {
            segment: TranscriptSegment::new(start, end, text, 0.9),
            speaker_id: speaker.to_string(),
            alignment_confidence: 1.0,
        }
    }

    fn classification(pairs: &[(&str, &str)], confidence: ConfidenceTier) -> RoleClassification {
        RoleClassification {
            assignments: pairs
                .iter()
                .map(|(id, role)| (id.to_string(), role.to_string()))
                .collect(),
            confidence,
        }
    }

    #[test]
    fn test_build_profiles() {
        let segments = vec![
            aligned(0.0, 3.0, "How are you today?", "A"),
            aligned(3.0, 9.0, "Not great, I could not sleep", "B"),
            aligned(9.0, 11.0, "Why do you think that is?", "A"),
        ];
        let a = stats("A", 5.0);
        let b = SpeakerStats {
            segment_count: 1,
            total_words: 6,
            ..stats("B", 6.0)
        };

        let profiles = build_profiles(&segments, &[&a, &b], 500);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].question_count, 2);
        assert_eq!(profiles[0].sample_text, "How are you today? Why do you think that is?");
        assert!((profiles[0].avg_words_per_segment - 4.5).abs() < 1e-9);
        assert_eq!(profiles[1].question_count, 0);
    }

    #[test]
    fn test_sample_is_truncated_on_char_boundary() {
        let segments = vec![aligned(0.0, 1.0, "ñññññ", "A")];
        let profiles = build_profiles(&segments, &[&stats("A", 1.0)], 3);
        assert_eq!(profiles[0].sample_text, "ñññ");
    }

    #[test]
    fn test_parse_classification() {
        let reply = r#"Here you go: {"assignments": {"A": "clinician", "B": "client"}, "confidence": "medium"}"#;
        let parsed = parse_classification(reply).unwrap();
        assert_eq!(parsed.confidence, ConfidenceTier::Medium);
        assert_eq!(parsed.assignments["A"], "clinician");

        assert!(matches!(parse_classification("I cannot tell"), Err(ContextualError::NoJson)));
        assert!(matches!(
            parse_classification(r#"{"assignments": {"A": "clinician"}}"#),
            Err(ContextualError::Malformed(_))
        ));
        assert!(matches!(
            parse_classification(r#"{"assignments": {}, "confidence": "certain"}"#),
            Err(ContextualError::Malformed(_))
        ));
    }

    #[test]
    fn test_validate_accepts_complete_assignment() {
        let (a, b, c) = (stats("A", 300.0), stats("B", 200.0), stats("C", 50.0));
        let ranked = vec![&a, &b, &c];

        let roles = validate_classification(
            classification(&[("A", "Clinician"), ("C", "client")], ConfidenceTier::High),
            &ranked,
            Some(ConfidenceTier::Medium),
        )
        .unwrap();

        assert_eq!(roles.get("A"), Some(Role::Clinician));
        assert_eq!(roles.get("C"), Some(Role::Client));
        assert_eq!(roles.get("B"), Some(Role::Speaker(3)));
    }

    #[test]
    fn test_validate_rejects_low_confidence() {
        let (a, b) = (stats("A", 300.0), stats("B", 200.0));
        let result = validate_classification(
            classification(&[("A", "clinician"), ("B", "client")], ConfidenceTier::Low),
            &[&a, &b],
            Some(ConfidenceTier::Medium),
        );
        assert!(matches!(result, Err(ContextualError::LowConfidence { .. })));

        // No minimum configured: any tier is accepted
        let result = validate_classification(
            classification(&[("A", "clinician"), ("B", "client")], ConfidenceTier::Low),
            &[&a, &b],
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_assignments() {
        let (a, b) = (stats("A", 300.0), stats("B", 200.0));
        let ranked = vec![&a, &b];

        let unknown = classification(&[("A", "clinician"), ("Z", "client")], ConfidenceTier::High);
        assert!(matches!(
            validate_classification(unknown, &ranked, None),
            Err(ContextualError::UnknownSpeaker(id)) if id == "Z"
        ));

        let two_clients = classification(&[("A", "client"), ("B", "client")], ConfidenceTier::High);
        assert!(matches!(
            validate_classification(two_clients, &ranked, None),
            Err(ContextualError::IncompleteAssignment { clinicians: 0, clients: 2 })
        ));

        let missing = classification(&[("A", "clinician")], ConfidenceTier::High);
        assert!(matches!(
            validate_classification(missing, &ranked, None),
            Err(ContextualError::IncompleteAssignment { .. })
        ));

        let odd_role = classification(&[("A", "clinician"), ("B", "nurse")], ConfidenceTier::High);
        assert!(matches!(
            validate_classification(odd_role, &ranked, None),
            Err(ContextualError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ConfidenceTier::Low < ConfidenceTier::Medium);
        assert!(ConfidenceTier::Medium < ConfidenceTier::High);
        assert_eq!("HIGH".parse::<ConfidenceTier>().unwrap(), ConfidenceTier::High);
    }
}
