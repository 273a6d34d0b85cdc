//! Model download and cache management for clinote
//!
//! Whisper and diarization model files live in a per-user cache directory.
//! The pipeline only ever reads from the cache; downloading is an explicit
//! user action.

pub mod error;
pub mod manager;
pub mod registry;

pub use error::ModelError;
pub use manager::{DiarizationModelPaths, DownloadProgress, ModelManager};
pub use registry::{
    get_all_models, get_model, ModelInfo, ModelType, DEFAULT_WHISPER_MODEL, DIARIZATION_MODELS,
    WHISPER_MODELS,
};
