//! Session pipeline for clinote
//!
//! Runs transcription and diarization side by side, aligns the two
//! timelines, aggregates speaker statistics and resolves roles. The
//! resulting [`clinote_core::SessionResult`] records which diarization and
//! role resolution methods were actually used.

pub mod config;
pub mod controller;
pub mod error;

pub use config::PipelineConfig;
pub use controller::SessionPipeline;
pub use error::PipelineError;
