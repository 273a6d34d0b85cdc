//! Prompt templates for speaker role classification

use serde::{Deserialize, Serialize};

/// Speaking profile of one anonymous speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerProfile {
    pub speaker_id: String,
    pub segment_count: usize,
    /// Seconds of speech
    pub total_duration: f64,
    pub total_words: usize,
    pub avg_words_per_segment: f64,
    /// Number of `?` in the speaker's text
    pub question_count: usize,
    /// Leading excerpt of everything the speaker said
    pub sample_text: String,
}

/// Build the role classification prompt.
///
/// The reply is expected as a single JSON object:
/// `{"assignments": {"<speaker id>": "clinician" | "client"}, "confidence": "low" | "medium" | "high"}`
pub fn build_role_prompt(profiles: &[SpeakerProfile]) -> String {
    let profiles_str = profiles
        .iter()
        .map(format_profile)
        .collect::<Vec<_>>()
        .join("\n\n");

    let example_ids: Vec<&str> = profiles.iter().map(|p| p.speaker_id.as_str()).take(2).collect();
    let (first, second) = match example_ids.as_slice() {
        [a, b, ..] => (*a, *b),
        _ => ("SPEAKER_00", "SPEAKER_01"),
    };

    format!(
        r#"You are analyzing a recorded clinical session to identify speaker roles.

## Speakers
{profiles_str}

## Task
Decide which speaker is most likely:
1. The CLINICIAN (professional register, asks questions, gives guidance or directives, uses clinical language)
2. The CLIENT (personal sharing, emotional expression, responds to questions)

Consider:
- Question-asking frequency
- Directive versus responsive language
- Professional versus personal register
- Topic initiation versus response patterns

Assign exactly one speaker as "clinician" and exactly one as "client". Use only the speaker ids listed above.

## Output Format
Return a JSON object:
```json
{{
  "assignments": {{
    "{first}": "clinician",
    "{second}": "client"
  }},
  "confidence": "high"
}}
```
"confidence" is one of "low", "medium", "high".

Return ONLY the JSON object, no other text."#,
        profiles_str = profiles_str,
        first = first,
        second = second,
    )
}

fn format_profile(profile: &SpeakerProfile) -> String {
    format!(
        "{id}:\n- Total segments: {segments}\n- Speaking time: {duration:.1} seconds\n- Total words: {words}\n- Average words per segment: {avg:.1}\n- Questions asked: {questions}\n- Sample text: \"{sample}\"",
        id = profile.speaker_id,
        segments = profile.segment_count,
        duration = profile.total_duration,
        words = profile.total_words,
        avg = profile.avg_words_per_segment,
        questions = profile.question_count,
        sample = profile.sample_text,
    )
}

/// Slice from the first `{` to the last `}`, models often wrap JSON in prose
/// or code fences
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}
