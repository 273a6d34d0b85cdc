//! Subcommand implementations

pub mod models;
pub mod ollama;
pub mod process;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clinote_models::ModelManager;

pub fn model_manager(models_dir: Option<PathBuf>) -> Result<ModelManager> {
    let manager = match models_dir {
        Some(dir) => ModelManager::with_cache_dir(dir),
        None => ModelManager::new(),
    };
    manager.context("Cannot open the model cache")
}
