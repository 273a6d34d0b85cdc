//! Model download and cache manager

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::registry::{get_all_models, get_model, ModelInfo, ModelType, DIARIZATION_MODELS};

/// Download progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Model name being downloaded
    pub model_name: String,
    /// Bytes downloaded so far
    pub bytes_downloaded: u64,
    /// Total bytes to download
    pub total_bytes: u64,
    /// Progress fraction (0.0 - 1.0)
    pub fraction: f64,
}

/// Cached files for neural diarization
#[derive(Debug, Clone, PartialEq)]
pub struct DiarizationModelPaths {
    pub segmentation: PathBuf,
    pub embedding: PathBuf,
}

/// Model download and cache manager
pub struct ModelManager {
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl ModelManager {
    /// Manager over the per-user cache directory
    pub fn new() -> Result<Self, ModelError> {
        let dirs = ProjectDirs::from("com", "clinote", "Clinote").ok_or_else(|| {
            ModelError::CacheDirectoryError("Could not determine cache directory".to_string())
        })?;

        Self::with_cache_dir(dirs.cache_dir().join("models"))
    }

    /// Create ModelManager with custom cache directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Result<Self, ModelError> {
        Ok(Self {
            cache_dir,
            client: reqwest::Client::builder()
                .user_agent(concat!("clinote/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| ModelError::DownloadFailed(e.to_string()))?,
        })
    }

    pub fn cache_directory(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the path where a model would be stored
    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.cache_dir
            .join(model.model_type.subdirectory())
            .join(&model.filename)
    }

    pub fn is_downloaded(&self, model: &ModelInfo) -> bool {
        self.model_path(model).exists()
    }

    /// Cached path of a model, failing if it is not downloaded
    pub fn resolve(&self, model_id: &str) -> Result<PathBuf, ModelError> {
        let model = get_model(model_id).ok_or_else(|| ModelError::ModelNotFound(model_id.to_string()))?;
        let path = self.model_path(&model);
        if path.exists() {
            Ok(path)
        } else {
            Err(ModelError::NotDownloaded(model.id))
        }
    }

    /// Cached segmentation and embedding models
    pub fn resolve_diarization_models(&self) -> Result<DiarizationModelPaths, ModelError> {
        let find = |model_type: ModelType| {
            DIARIZATION_MODELS
                .iter()
                .find(|m| m.model_type == model_type)
                .ok_or_else(|| ModelError::ModelNotFound(format!("{:?}", model_type)))
                .and_then(|m| self.resolve(&m.id))
        };

        Ok(DiarizationModelPaths {
            segmentation: find(ModelType::Segmentation)?,
            embedding: find(ModelType::Embedding)?,
        })
    }

    /// Download a model with progress callback
    pub async fn download<F>(&self, model: &ModelInfo, progress_callback: F) -> Result<PathBuf, ModelError>
    where
        F: Fn(DownloadProgress) + Send + 'static,
    {
        let dest_path = self.model_path(model);

        if dest_path.exists() {
            info!("Model {} already downloaded", model.name);
            return Ok(dest_path);
        }

        info!("Downloading model: {} from {}", model.name, model.url);

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(&model.url)
            .send()
            .await
            .map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelError::DownloadFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let total_size = response.content_length().unwrap_or(model.size_bytes);

        // Partial downloads never land at the final path
        let temp_path = dest_path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            progress_callback(DownloadProgress {
                model_name: model.name.clone(),
                bytes_downloaded: downloaded,
                total_bytes: total_size,
                fraction: if total_size > 0 {
                    (downloaded as f64 / total_size as f64).min(1.0)
                } else {
                    0.0
                },
            });
        }

        file.flush().await?;
        drop(file);

        if !model.sha256.is_empty() {
            debug!("Verifying model checksum...");
            if let Err(e) = verify_sha256(&temp_path, &model.sha256).await {
                fs::remove_file(&temp_path).await?;
                return Err(e);
            }
        }

        fs::rename(&temp_path, &dest_path).await?;

        info!("Model {} downloaded successfully", model.name);
        Ok(dest_path)
    }

    /// Delete a downloaded model by ID
    pub async fn delete_by_id(&self, model_id: &str) -> Result<(), ModelError> {
        let model = get_model(model_id).ok_or_else(|| ModelError::ModelNotFound(model_id.to_string()))?;
        let path = self.model_path(&model);
        if path.exists() {
            fs::remove_file(&path).await?;
            info!("Model {} deleted", model.name);
        }
        Ok(())
    }

    /// Registry entries paired with their cache state
    pub fn list(&self) -> Vec<(ModelInfo, bool)> {
        get_all_models()
            .into_iter()
            .map(|m| {
                let downloaded = self.is_downloaded(&m);
                (m, downloaded)
            })
            .collect()
    }
}

async fn verify_sha256(path: &Path, expected: &str) -> Result<(), ModelError> {
    let data = fs::read(path).await?;
    let actual = hex::encode(Sha256::digest(&data));
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ModelError::VerificationFailed {
            expected: expected.to_string(),
            actual,
        })
    }
}
