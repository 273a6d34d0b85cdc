//! Session export

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::types::SessionResult;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Files written by [`Exporter::write_session`]
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub transcript: PathBuf,
    pub subtitles: PathBuf,
}

/// Session exporter
pub struct Exporter;

impl Exporter {
    /// Write JSON, transcript and subtitle files into `output_dir`.
    ///
    /// File names carry the audio stem and a local timestamp. When that name
    /// is already taken, for example by another file with the same stem in
    /// the same batch, a `_2`, `_3`, ... suffix is appended. Existing files
    /// are never overwritten.
    pub fn write_session<P: AsRef<Path>>(
        result: &SessionResult,
        output_dir: P,
    ) -> Result<ExportPaths, ExportError> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let stem = Path::new(&result.audio_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("session");
        let base = format!("{}_{}", stem, Local::now().format("%Y%m%d_%H%M%S"));
        let paths = free_paths(output_dir, &base);

        Self::to_json(result, &paths.json, true)?;
        Self::to_text(result, &paths.transcript)?;
        Self::to_srt(result, &paths.subtitles)?;

        info!("Session exported to {}", output_dir.display());
        Ok(paths)
    }

    /// Export the full session as JSON
    pub fn to_json<P: AsRef<Path>>(
        result: &SessionResult,
        output_path: P,
        pretty: bool,
    ) -> Result<(), ExportError> {
        let json = if pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };

        write_file(output_path.as_ref(), &json)
    }

    /// Export a readable transcript with a method header
    pub fn to_text<P: AsRef<Path>>(result: &SessionResult, output_path: P) -> Result<(), ExportError> {
        let mut content = String::new();
        content.push_str("SESSION TRANSCRIPT\n");
        content.push_str(&"=".repeat(50));
        content.push('\n');
        content.push_str(&format!("Audio: {}\n", result.audio_path));
        content.push_str(&format!("Language: {}\n", result.language));
        content.push_str(&format!("Duration: {:.1}s\n", result.duration));
        content.push_str(&format!(
            "Diarization: {}\n",
            result.metadata.diarization_method_used
        ));
        content.push_str(&format!(
            "Role resolution: {}\n\n",
            result.metadata.role_resolution_method_used
        ));
        content.push_str(&Self::format_transcript(result));
        content.push('\n');

        write_file(output_path.as_ref(), &content)
    }

    /// Export SRT subtitles with the role as a prefix
    pub fn to_srt<P: AsRef<Path>>(result: &SessionResult, output_path: P) -> Result<(), ExportError> {
        let mut content = String::new();

        for (i, segment) in result.segments.iter().enumerate() {
            content.push_str(&format!(
                "{}\n{} --> {}\n{}: {}\n\n",
                i + 1,
                Self::seconds_to_srt_time(segment.start),
                Self::seconds_to_srt_time(segment.end),
                segment.speaker,
                segment.text
            ));
        }

        write_file(output_path.as_ref(), &content)
    }

    /// `[12.3s] Clinician: text`, one line per segment
    pub fn format_transcript(result: &SessionResult) -> String {
        result
            .segments
            .iter()
            .map(|s| format!("[{:.1}s] {}: {}", s.start, s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn seconds_to_srt_time(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let ms = total_ms % 1000;
        let total_seconds = total_ms / 1000;
        let secs = total_seconds % 60;
        let mins = (total_seconds / 60) % 60;
        let hours = total_seconds / 3600;

        format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
    }
}

/// First `base`, `base_2`, `base_3`, ... with none of its files present
fn free_paths(output_dir: &Path, base: &str) -> ExportPaths {
    let paths_for = |name: &str| ExportPaths {
        json: output_dir.join(format!("{}.json", name)),
        transcript: output_dir.join(format!("{}.txt", name)),
        subtitles: output_dir.join(format!("{}.srt", name)),
    };
    let taken = |p: &ExportPaths| p.json.exists() || p.transcript.exists() || p.subtitles.exists();

    std::iter::once(base.to_string())
        .chain((2..).map(|n| format!("{}_{}", base, n)))
        .map(|name| paths_for(&name))
        .find(|p| !taken(p))
        .unwrap_or_else(|| paths_for(base))
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
