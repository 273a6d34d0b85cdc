//! Duration-ranked role assignment

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use clinote_core::{Role, RoleAssignment, SpeakerStats, UNKNOWN_SPEAKER};

/// Role given to the speaker with the most speech when two or more speak.
///
/// The default, `Client`, encodes the assumption that clients talk more than
/// clinicians in session. It is a convention, not a measured fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantSpeakerRole {
    #[default]
    Client,
    Clinician,
}

impl DominantSpeakerRole {
    fn dominant(self) -> Role {
        match self {
            DominantSpeakerRole::Client => Role::Client,
            DominantSpeakerRole::Clinician => Role::Clinician,
        }
    }

    fn runner_up(self) -> Role {
        match self {
            DominantSpeakerRole::Client => Role::Clinician,
            DominantSpeakerRole::Clinician => Role::Client,
        }
    }
}

impl fmt::Display for DominantSpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DominantSpeakerRole::Client => write!(f, "client"),
            DominantSpeakerRole::Clinician => write!(f, "clinician"),
        }
    }
}

impl FromStr for DominantSpeakerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(DominantSpeakerRole::Client),
            "clinician" => Ok(DominantSpeakerRole::Clinician),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Known speakers ordered by speaking time.
///
/// Most speech first, then earliest appearance, then speaker id.
pub fn rank_speakers(stats: &[SpeakerStats]) -> Vec<&SpeakerStats> {
    let mut ranked: Vec<&SpeakerStats> = stats
        .iter()
        .filter(|s| s.speaker_id != UNKNOWN_SPEAKER)
        .collect();
    ranked.sort_by(|a, b| rank_order(a, b));
    ranked
}

fn rank_order(a: &SpeakerStats, b: &SpeakerStats) -> Ordering {
    b.total_duration
        .total_cmp(&a.total_duration)
        .then(a.first_appearance.total_cmp(&b.first_appearance))
        .then_with(|| a.speaker_id.cmp(&b.speaker_id))
}

/// Ranked speakers rearranged into role slots: dominant role, the other
/// primary role, then extra speakers.
///
/// The Clinician is the earliest-appearing speaker among those whose
/// duration equals the Clinician slot's. Everyone else keeps ranked order.
fn slot_order<'a>(ranked: &[&'a SpeakerStats], dominant: DominantSpeakerRole) -> Vec<&'a SpeakerStats> {
    let clinician_slot = match dominant {
        DominantSpeakerRole::Client => 1,
        DominantSpeakerRole::Clinician => 0,
    };
    let mut order = ranked.to_vec();
    let Some(slot) = ranked.get(clinician_slot) else {
        return order;
    };

    // Ranked order puts the earliest of a duration tie first
    let clinician = ranked
        .iter()
        .position(|s| s.total_duration.total_cmp(&slot.total_duration).is_eq())
        .unwrap_or(clinician_slot);

    let picked = order.remove(clinician);
    order.insert(clinician_slot, picked);
    order
}

/// Role for a position in slot order
fn role_for_rank(rank: usize, dominant: DominantSpeakerRole) -> Role {
    match rank {
        0 => dominant.dominant(),
        1 => dominant.runner_up(),
        n => Role::Speaker(n + 1),
    }
}

/// Heuristic pass. Never fails.
///
/// No speakers gives an empty assignment and a lone speaker is always the
/// Clinician. Otherwise the most speech gets the dominant role and the next
/// speaker the other primary role, with duration ties broken so the
/// earliest-appearing speaker is the Clinician. Remaining speakers become
/// `Speaker_3`, `Speaker_4`, ... in ranked order.
pub fn heuristic_assignment(stats: &[SpeakerStats], dominant: DominantSpeakerRole) -> RoleAssignment {
    match rank_speakers(stats).as_slice() {
        [] => RoleAssignment::empty(),
        [only] => std::iter::once((only.speaker_id.clone(), Role::Clinician)).collect(),
        ranked => slot_order(ranked, dominant)
            .into_iter()
            .enumerate()
            .map(|(rank, s)| (s.speaker_id.clone(), role_for_rank(rank, dominant)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(id: &str, duration: f64, first: f64) -> SpeakerStats {
        SpeakerStats {
            speaker_id: id.to_string(),
            total_duration: duration,
            segment_count: 1,
            total_words: 10,
            first_appearance: first,
        }
    }

    #[test]
    fn test_no_speakers() {
        assert!(heuristic_assignment(&[], DominantSpeakerRole::Client).is_empty());
        let only_unknown = vec![stats(UNKNOWN_SPEAKER, 30.0, 0.0)];
        assert!(heuristic_assignment(&only_unknown, DominantSpeakerRole::Client).is_empty());
    }

    #[test]
    fn test_single_speaker_is_clinician() {
        for dominant in [DominantSpeakerRole::Client, DominantSpeakerRole::Clinician] {
            let roles = heuristic_assignment(&[stats("A", 120.0, 0.0)], dominant);
            assert_eq!(roles.len(), 1);
            assert_eq!(roles.get("A"), Some(Role::Clinician));
        }
    }

    #[test]
    fn test_more_speech_is_client() {
        let all = vec![stats("A", 200.0, 0.0), stats("B", 500.0, 3.0)];
        let roles = heuristic_assignment(&all, DominantSpeakerRole::Client);
        assert_eq!(roles.get("B"), Some(Role::Client));
        assert_eq!(roles.get("A"), Some(Role::Clinician));
    }

    #[test]
    fn test_dominant_role_is_configurable() {
        let all = vec![stats("A", 200.0, 0.0), stats("B", 500.0, 3.0)];
        let roles = heuristic_assignment(&all, DominantSpeakerRole::Clinician);
        assert_eq!(roles.get("B"), Some(Role::Clinician));
        assert_eq!(roles.get("A"), Some(Role::Client));
    }

    #[test]
    fn test_equal_duration_earliest_is_clinician() {
        for dominant in [DominantSpeakerRole::Client, DominantSpeakerRole::Clinician] {
            let all = vec![stats("B", 10.0, 35.0), stats("A", 10.0, 0.0)];
            let roles = heuristic_assignment(&all, dominant);
            assert_eq!(roles.get("A"), Some(Role::Clinician));
            assert_eq!(roles.get("B"), Some(Role::Client));
        }
    }

    #[test]
    fn test_three_way_tie_earliest_is_clinician() {
        let all = vec![stats("C", 10.0, 9.0), stats("A", 10.0, 0.0), stats("B", 10.0, 5.0)];

        let roles = heuristic_assignment(&all, DominantSpeakerRole::Client);
        assert_eq!(roles.get("A"), Some(Role::Clinician));
        assert_eq!(roles.get("B"), Some(Role::Client));
        assert_eq!(roles.get("C"), Some(Role::Speaker(3)));

        let roles = heuristic_assignment(&all, DominantSpeakerRole::Clinician);
        assert_eq!(roles.get("A"), Some(Role::Clinician));
        assert_eq!(roles.get("B"), Some(Role::Client));
        assert_eq!(roles.get("C"), Some(Role::Speaker(3)));
    }

    #[test]
    fn test_tied_runner_up_earliest_is_clinician() {
        let all = vec![stats("A", 100.0, 0.0), stats("C", 50.0, 2.0), stats("B", 50.0, 1.0)];
        let roles = heuristic_assignment(&all, DominantSpeakerRole::Client);

        assert_eq!(roles.get("A"), Some(Role::Client));
        assert_eq!(roles.get("B"), Some(Role::Clinician));
        assert_eq!(roles.get("C"), Some(Role::Speaker(3)));
    }

    #[test]
    fn test_later_dominant_tie_hands_clinician_to_earlier() {
        // The earliest speaker ranks first, so it moves down into the Clinician slot
        let all = vec![stats("A", 10.0, 5.0), stats("B", 10.0, 0.0), stats("C", 4.0, 1.0)];
        let roles = heuristic_assignment(&all, DominantSpeakerRole::Client);

        assert_eq!(roles.get("B"), Some(Role::Clinician));
        assert_eq!(roles.get("A"), Some(Role::Client));
        assert_eq!(roles.get("C"), Some(Role::Speaker(3)));
    }

    #[test]
    fn test_ranking_ignores_dominant_role() {
        let all = vec![stats("B", 10.0, 5.0), stats("A", 10.0, 0.0), stats("C", 30.0, 9.0)];
        let ids: Vec<&str> = rank_speakers(&all).iter().map(|s| s.speaker_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_full_tie_uses_speaker_id() {
        let all = vec![stats("Y", 10.0, 0.0), stats("X", 10.0, 0.0)];
        let ranked = rank_speakers(&all);
        assert_eq!(ranked[0].speaker_id, "X");
    }

    #[test]
    fn test_extra_speakers_numbered_in_rank_order() {
        let all = vec![
            stats("A", 50.0, 0.0),
            stats("B", 300.0, 1.0),
            stats("C", 10.0, 2.0),
            stats("D", 120.0, 3.0),
            stats(UNKNOWN_SPEAKER, 999.0, 0.0),
        ];
        let roles = heuristic_assignment(&all, DominantSpeakerRole::Client);

        assert_eq!(roles.len(), 4);
        assert_eq!(roles.get("B"), Some(Role::Client));
        assert_eq!(roles.get("D"), Some(Role::Clinician));
        assert_eq!(roles.get("A"), Some(Role::Speaker(3)));
        assert_eq!(roles.get("C"), Some(Role::Speaker(4)));
        assert_eq!(roles.get(UNKNOWN_SPEAKER), None);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = vec![stats("A", 40.0, 0.0), stats("B", 40.0, 5.0), stats("C", 7.0, 9.0)];
        let reversed: Vec<SpeakerStats> = forward.iter().rev().cloned().collect();
        assert_eq!(
            heuristic_assignment(&forward, DominantSpeakerRole::Client),
            heuristic_assignment(&reversed, DominantSpeakerRole::Client)
        );
    }

    #[test]
    fn test_dominant_role_parsing() {
        assert_eq!("Client".parse::<DominantSpeakerRole>().unwrap(), DominantSpeakerRole::Client);
        assert_eq!(DominantSpeakerRole::Clinician.to_string(), "clinician");
        assert!("nurse".parse::<DominantSpeakerRole>().is_err());
    }
}
