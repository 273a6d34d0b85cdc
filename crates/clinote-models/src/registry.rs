//! Registry of downloadable models

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Whisper model used when none is specified
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-base";

const PYANNOTE_RELEASE: &str = "https://github.com/thewh1teagle/pyannote-rs/releases/download/v0.1.0";
const WHISPER_REPO: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Model type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Whisper ASR model (ggml)
    Whisper,
    /// Speech segmentation model (ONNX)
    Segmentation,
    /// Speaker embedding model (ONNX)
    Embedding,
}

impl ModelType {
    /// Cache subdirectory for this model type
    pub fn subdirectory(&self) -> &'static str {
        match self {
            ModelType::Whisper => "whisper",
            ModelType::Segmentation | ModelType::Embedding => "diarization",
        }
    }
}

/// Model information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: String,
    /// Display name
    pub name: String,
    pub model_type: ModelType,
    /// File name inside the cache
    pub filename: String,
    /// Download URL
    pub url: String,
    /// Approximate file size in bytes
    pub size_bytes: u64,
    /// SHA256 hash for verification (empty if unknown)
    pub sha256: String,
    pub description: String,
}

impl ModelInfo {
    fn new(
        id: &str,
        name: &str,
        model_type: ModelType,
        filename: &str,
        url: String,
        size_bytes: u64,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            model_type,
            filename: filename.to_string(),
            url,
            size_bytes,
            sha256: String::new(),
            description: description.to_string(),
        }
    }

    /// Get human-readable size string
    pub fn size_string(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.1} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.0} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.0} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}

fn whisper(id: &str, name: &str, file: &str, size_bytes: u64, description: &str) -> ModelInfo {
    ModelInfo::new(
        id,
        name,
        ModelType::Whisper,
        file,
        format!("{}/{}", WHISPER_REPO, file),
        size_bytes,
        description,
    )
}

/// Available Whisper models
pub static WHISPER_MODELS: LazyLock<Vec<ModelInfo>> = LazyLock::new(|| {
    vec![
        whisper("whisper-tiny", "Whisper Tiny", "ggml-tiny.bin", 75_000_000, "Fastest, lowest accuracy"),
        whisper("whisper-base", "Whisper Base", "ggml-base.bin", 142_000_000, "Fast, good accuracy"),
        whisper("whisper-small", "Whisper Small", "ggml-small.bin", 466_000_000, "Balanced speed and accuracy"),
        whisper("whisper-medium", "Whisper Medium", "ggml-medium.bin", 1_500_000_000, "High accuracy"),
        whisper(
            "whisper-large-v3",
            "Whisper Large V3",
            "ggml-large-v3.bin",
            3_000_000_000,
            "Highest accuracy, slowest",
        ),
    ]
});

/// Models needed by neural diarization, segmentation first
pub static DIARIZATION_MODELS: LazyLock<Vec<ModelInfo>> = LazyLock::new(|| {
    vec![
        ModelInfo::new(
            "segmentation-3.0",
            "Pyannote Segmentation 3.0",
            ModelType::Segmentation,
            "segmentation-3.0.onnx",
            format!("{}/segmentation-3.0.onnx", PYANNOTE_RELEASE),
            6_000_000,
            "Speech activity and speaker change detection",
        ),
        ModelInfo::new(
            "wespeaker-cam",
            "WeSpeaker CAM++ Embedding",
            ModelType::Embedding,
            "wespeaker_en_voxceleb_CAM++.onnx",
            format!("{}/wespeaker_en_voxceleb_CAM++.onnx", PYANNOTE_RELEASE),
            28_000_000,
            "Speaker embedding extraction",
        ),
    ]
});

/// Get model info by ID
pub fn get_model(id: &str) -> Option<ModelInfo> {
    WHISPER_MODELS
        .iter()
        .chain(DIARIZATION_MODELS.iter())
        .find(|m| m.id == id)
        .cloned()
}

/// Get all available models
pub fn get_all_models() -> Vec<ModelInfo> {
    WHISPER_MODELS
        .iter()
        .chain(DIARIZATION_MODELS.iter())
        .cloned()
        .collect()
}
