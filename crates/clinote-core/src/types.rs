//! Shared session types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Speaker id given to segments no diarization turn covers
pub const UNKNOWN_SPEAKER: &str = "unknown";

/// Recognized speech span from the transcription engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
    /// Engine confidence (0.0 - 1.0)
    pub recognition_confidence: f64,
}

impl TranscriptSegment {
    /// Create a segment, clamping confidence into [0, 1]
    pub fn new(start: f64, end: f64, text: impl Into<String>, recognition_confidence: f64) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            recognition_confidence: clamp_unit(recognition_confidence),
        }
    }

    /// Segment duration in seconds
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Temporal midpoint in seconds
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Whitespace-separated word count
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Transcription engine output for one audio file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Segments ordered by start time
    pub segments: Vec<TranscriptSegment>,
    /// Detected or requested language code
    pub language: String,
    /// Audio duration in seconds
    pub duration: f64,
}

/// Contiguous interval attributed to one anonymous speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizationTurn {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Session-scoped speaker token (e.g. "SPEAKER_00")
    pub speaker_id: String,
}

impl DiarizationTurn {
    pub fn new(start: f64, end: f64, speaker_id: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker_id: speaker_id.into(),
        }
    }

    /// Turn duration in seconds
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Finite bounds with `end >= start`
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end >= self.start
    }

    /// Half-open containment: `start <= time < end`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Length of the overlap with `[start, end]`
    pub fn intersection(&self, start: f64, end: f64) -> f64 {
        (self.end.min(end) - self.start.max(start)).max(0.0)
    }
}

/// Transcript segment tagged with the speaker that aligned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSegment {
    #[serde(flatten)]
    pub segment: TranscriptSegment,
    /// Matched speaker id, or [`UNKNOWN_SPEAKER`]
    pub speaker_id: String,
    /// Intersection / segment duration, bounded to [0, 1].
    ///
    /// This is an overlap ratio, not a probability.
    pub alignment_confidence: f64,
}

impl AlignedSegment {
    /// Segment with no overlapping turn
    pub fn unknown(segment: TranscriptSegment) -> Self {
        Self {
            segment,
            speaker_id: UNKNOWN_SPEAKER.to_string(),
            alignment_confidence: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.speaker_id == UNKNOWN_SPEAKER
    }
}

/// Per-speaker aggregates derived from aligned segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerStats {
    /// Speaker id (may be [`UNKNOWN_SPEAKER`])
    pub speaker_id: String,
    /// Sum of aligned segment durations in seconds
    pub total_duration: f64,
    /// Number of aligned segments
    pub segment_count: usize,
    /// Whitespace-tokenized word count
    pub total_words: usize,
    /// Earliest segment start in seconds
    pub first_appearance: f64,
}

/// Semantic participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Role {
    Clinician,
    Client,
    /// Generic participant, numbered from 3
    Speaker(usize),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Clinician => write!(f, "Clinician"),
            Role::Client => write!(f, "Client"),
            Role::Speaker(n) => write!(f, "Speaker_{}", n),
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Clinician" => Ok(Role::Clinician),
            "Client" => Ok(Role::Client),
            other => other
                .strip_prefix("Speaker_")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 2)
                .map(Role::Speaker)
                .ok_or_else(|| CoreError::InvalidRole(other.to_string())),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Complete speaker id -> role mapping for one session.
///
/// Built in one pass and replaced wholesale; there is no partial update API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleAssignment(BTreeMap<String, Role>);

impl RoleAssignment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, speaker_id: &str) -> Option<Role> {
        self.0.get(speaker_id).copied()
    }

    /// Display label for a speaker: its role, or the raw id when unmapped
    pub fn label_for(&self, speaker_id: &str) -> String {
        self.get(speaker_id)
            .map(|role| role.to_string())
            .unwrap_or_else(|| speaker_id.to_string())
    }

    /// Speaker id holding `role`, if any
    pub fn speaker_with(&self, role: Role) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, r)| **r == role)
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> {
        self.0.iter().map(|(id, role)| (id.as_str(), *role))
    }

    /// Substitute speaker ids with role labels
    pub fn apply(&self, aligned: &[AlignedSegment]) -> Vec<SessionSegment> {
        aligned
            .iter()
            .map(|a| SessionSegment {
                start: a.segment.start,
                end: a.segment.end,
                text: a.segment.text.clone(),
                recognition_confidence: a.segment.recognition_confidence,
                speaker: self.label_for(&a.speaker_id),
                speaker_id: a.speaker_id.clone(),
                alignment_confidence: a.alignment_confidence,
            })
            .collect()
    }
}

impl FromIterator<(String, Role)> for RoleAssignment {
    fn from_iter<I: IntoIterator<Item = (String, Role)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Diarization strategy that actually produced the turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiarizationMethod {
    /// Pause-based heuristic
    Simple,
    /// Neural diarization model
    Neural,
}

impl fmt::Display for DiarizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiarizationMethod::Simple => write!(f, "simple"),
            DiarizationMethod::Neural => write!(f, "neural"),
        }
    }
}

/// Role resolution path whose result was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleResolutionMethod {
    Heuristic,
    Contextual,
}

impl fmt::Display for RoleResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleResolutionMethod::Heuristic => write!(f, "heuristic"),
            RoleResolutionMethod::Contextual => write!(f, "contextual"),
        }
    }
}

/// Final role-tagged segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
    /// Engine confidence (0.0 - 1.0)
    pub recognition_confidence: f64,
    /// Role label ("Clinician", "Client", "Speaker_N") or "unknown"
    pub speaker: String,
    /// Anonymous speaker id the role was resolved from
    pub speaker_id: String,
    /// Overlap ratio from alignment
    pub alignment_confidence: f64,
}

/// Paths actually taken while producing a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub diarization_method_used: DiarizationMethod,
    pub role_resolution_method_used: RoleResolutionMethod,
    /// Why neural diarization was abandoned, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diarization_fallback_reason: Option<String>,
    /// Why the contextual role pass was discarded, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_resolution_fallback_reason: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Pipeline output for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Source audio path
    pub audio_path: String,
    /// Transcript language code
    pub language: String,
    /// Audio duration in seconds
    pub duration: f64,
    /// Role-tagged segments in transcript order
    pub segments: Vec<SessionSegment>,
    /// Resolved speaker roles
    pub roles: RoleAssignment,
    /// Per-speaker statistics, "unknown" included
    pub speakers: Vec<SpeakerStats>,
    pub metadata: SessionMetadata,
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
