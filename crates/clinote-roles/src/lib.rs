//! Speaker role resolution
//!
//! Anonymous speaker ids become "Clinician", "Client" or "Speaker_N".
//! A duration ranking always produces an assignment; an optional
//! classification by a local language model may replace it wholesale.

pub mod contextual;
pub mod error;
pub mod heuristic;
pub mod resolver;

pub use contextual::{
    build_profiles, parse_classification, validate_classification, ConfidenceTier,
    RoleClassification,
};
pub use error::ContextualError;
pub use heuristic::{heuristic_assignment, rank_speakers, DominantSpeakerRole};
pub use resolver::{RoleResolution, RoleResolver, RoleResolverConfig};
