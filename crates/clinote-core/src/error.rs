//! Core error types

use thiserror::Error;

/// Errors raised while building session data
#[derive(Error, Debug)]
pub enum CoreError {
    /// Interval with a non-finite bound or end before start
    #[error("Invalid {kind} interval [{start}, {end}]")]
    InvalidInterval {
        kind: &'static str,
        start: f64,
        end: f64,
    },

    /// Unrecognized role label
    #[error("Invalid role label: {0}")]
    InvalidRole(String),
}
