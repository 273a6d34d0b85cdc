//! Role resolution state machine
//!
//! The heuristic assignment is always computed first. With the contextual
//! pass enabled and at least two known speakers, one bounded request goes to
//! the language model. Its answer replaces the heuristic assignment only if
//! it validates completely; otherwise the heuristic assignment is returned
//! untouched and the reason is recorded.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use clinote_core::{AlignedSegment, RoleAssignment, RoleResolutionMethod, SpeakerStats};
use clinote_llm::{build_role_prompt, LlmError, LlmProvider};

use crate::contextual::{build_profiles, parse_classification, validate_classification, ConfidenceTier};
use crate::error::ContextualError;
use crate::heuristic::{heuristic_assignment, rank_speakers, DominantSpeakerRole};

const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Role resolver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleResolverConfig {
    /// Attempt the language model classification
    pub contextual_enabled: bool,
    /// Upper bound on the language model request, in seconds
    pub timeout_secs: f64,
    /// Reject classifications reported below this tier
    pub min_confidence: Option<ConfidenceTier>,
    /// Characters of each speaker's text included in the prompt
    pub sample_chars: usize,
    pub dominant_speaker_role: DominantSpeakerRole,
}

impl Default for RoleResolverConfig {
    fn default() -> Self {
        Self {
            contextual_enabled: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_confidence: None,
            sample_chars: 500,
            dominant_speaker_role: DominantSpeakerRole::default(),
        }
    }
}

impl RoleResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }
}

/// Assignment plus the path that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RoleResolution {
    pub assignment: RoleAssignment,
    pub method: RoleResolutionMethod,
    /// Why a contextual attempt was discarded
    pub fallback_reason: Option<String>,
}

impl RoleResolution {
    fn heuristic(assignment: RoleAssignment, fallback_reason: Option<String>) -> Self {
        Self {
            assignment,
            method: RoleResolutionMethod::Heuristic,
            fallback_reason,
        }
    }
}

/// Resolves anonymous speakers to roles for one session at a time
pub struct RoleResolver<P> {
    config: RoleResolverConfig,
    llm: Option<P>,
}

impl<P: LlmProvider> RoleResolver<P> {
    pub fn new(config: RoleResolverConfig, llm: Option<P>) -> Self {
        Self { config, llm }
    }

    /// Resolve roles. Never fails.
    ///
    /// `stats` may include the "unknown" pseudo-speaker; it is ignored.
    pub async fn resolve(&self, stats: &[SpeakerStats], aligned: &[AlignedSegment]) -> RoleResolution {
        let dominant = self.config.dominant_speaker_role;
        let heuristic = heuristic_assignment(stats, dominant);

        if !self.config.contextual_enabled {
            debug!("Contextual role resolution disabled");
            return RoleResolution::heuristic(heuristic, None);
        }

        let ranked = rank_speakers(stats);
        if ranked.len() < 2 {
            debug!("{} known speaker(s), skipping contextual pass", ranked.len());
            return RoleResolution::heuristic(heuristic, None);
        }

        match self.classify(&ranked, aligned).await {
            Ok(assignment) => {
                info!("Contextual role classification accepted");
                RoleResolution {
                    assignment,
                    method: RoleResolutionMethod::Contextual,
                    fallback_reason: None,
                }
            }
            Err(e) => {
                warn!("Contextual role classification discarded, keeping heuristic roles: {}", e);
                RoleResolution::heuristic(heuristic, Some(e.to_string()))
            }
        }
    }

    async fn classify(
        &self,
        ranked: &[&SpeakerStats],
        aligned: &[AlignedSegment],
    ) -> Result<RoleAssignment, ContextualError> {
        let llm = self.llm.as_ref().ok_or(ContextualError::NoProvider)?;

        let profiles = build_profiles(aligned, ranked, self.config.sample_chars);
        let prompt = build_role_prompt(&profiles);
        debug!("Role prompt for {} speakers ({} chars)", profiles.len(), prompt.len());

        let timeout = self.config.timeout();
        // The HTTP client carries the same deadline and may report it first
        let reply = tokio::time::timeout(timeout, llm.complete(&prompt))
            .await
            .map_err(|_| ContextualError::Timeout(timeout))?
            .map_err(|e| match e {
                LlmError::Timeout => ContextualError::Timeout(timeout),
                other => ContextualError::Llm(other),
            })?;

        let classification = parse_classification(&reply)?;
        validate_classification(classification, ranked, self.config.min_confidence)
    }
}
