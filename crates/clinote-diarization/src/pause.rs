//! Pause-based speaker diarization
//!
//! Speech regions are found from frame energy. Silences longer than
//! `turn_change_gap` are taken as a change of speaker, alternating between
//! two anonymous speakers. No model is needed, so this strategy is always
//! available.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clinote_core::{AudioData, AudioProcessor, DiarizationTurn};

use crate::error::DiarizationError;
use crate::provider::speaker_label;

/// Thresholds for speech detection and turn changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseOptions {
    /// Analysis frame length in milliseconds
    pub frame_ms: u32,
    /// Frames at or below this RMS level (dBFS) are silence
    pub silence_threshold_db: f32,
    /// Shorter silences are bridged into one region (seconds)
    pub min_silence: f64,
    /// Longer silences switch the speaker (seconds)
    pub turn_change_gap: f64,
    /// Shorter speech regions are dropped (seconds)
    pub min_speech: f64,
}

impl Default for PauseOptions {
    fn default() -> Self {
        Self {
            frame_ms: 30,
            silence_threshold_db: -40.0,
            min_silence: 0.5,
            turn_change_gap: 2.0,
            min_speech: 0.2,
        }
    }
}

/// Energy-based diarizer alternating speakers on long pauses
#[derive(Debug, Clone, Default)]
pub struct PauseDiarizer {
    options: PauseOptions,
}

impl PauseDiarizer {
    pub fn new(options: PauseOptions) -> Self {
        Self { options }
    }

    /// Decode `audio_path` and detect turns
    pub async fn diarize(&self, audio_path: &Path) -> Result<Vec<DiarizationTurn>, DiarizationError> {
        info!("Starting pause-based diarization: {}", audio_path.display());

        let path = audio_path.to_path_buf();
        let options = self.options.clone();

        let turns = tokio::task::spawn_blocking(move || {
            let audio = AudioProcessor::default().load(&path)?;
            Ok::<_, DiarizationError>(detect_turns(&audio, &options))
        })
        .await
        .map_err(|e| DiarizationError::DiarizationFailed(e.to_string()))??;

        info!("Pause-based diarization completed: {} turns", turns.len());
        Ok(turns)
    }
}

/// Turns for already decoded audio
pub fn detect_turns(audio: &AudioData, options: &PauseOptions) -> Vec<DiarizationTurn> {
    let regions = speech_regions(&audio.samples, audio.sample_rate, options);
    debug!("Detected {} speech regions", regions.len());
    assign_speakers(&regions, options.turn_change_gap)
}

/// `(start, end)` speech regions in seconds
pub fn speech_regions(samples: &[f32], sample_rate: u32, options: &PauseOptions) -> Vec<(f64, f64)> {
    if sample_rate == 0 || samples.is_empty() {
        return Vec::new();
    }

    let frame_len = ((sample_rate as u64 * options.frame_ms as u64 / 1000) as usize).max(1);
    let rate = sample_rate as f64;

    let voiced_runs = samples
        .chunks(frame_len)
        .enumerate()
        .filter(|(_, frame)| rms_db(frame) > options.silence_threshold_db)
        .map(|(i, frame)| {
            let start = i * frame_len;
            (start as f64 / rate, (start + frame.len()) as f64 / rate)
        });

    let merged = voiced_runs.fold(Vec::<(f64, f64)>::new(), |mut acc, (start, end)| {
        match acc.last_mut() {
            Some(last) if start - last.1 < options.min_silence => last.1 = end,
            _ => acc.push((start, end)),
        }
        acc
    });

    merged
        .into_iter()
        .filter(|(start, end)| end - start >= options.min_speech)
        .collect()
}

/// Alternate between two speakers whenever the gap exceeds `turn_change_gap`
pub fn assign_speakers(regions: &[(f64, f64)], turn_change_gap: f64) -> Vec<DiarizationTurn> {
    regions
        .iter()
        .scan((0usize, None::<f64>), |(speaker, prev_end), &(start, end)| {
            if prev_end.is_some_and(|prev| start - prev > turn_change_gap) {
                *speaker = 1 - *speaker;
            }
            *prev_end = Some(end);
            Some(DiarizationTurn::new(start, end, speaker_label(*speaker)))
        })
        .collect()
}

fn rms_db(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return f32::NEG_INFINITY;
    }
    let mean_square = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    20.0 * mean_square.sqrt().max(1e-10).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;

    fn tone(seconds: f64) -> Vec<f32> {
        let n = (seconds * RATE as f64) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / RATE as f32).sin())
            .collect()
    }

    fn silence(seconds: f64) -> Vec<f32> {
        vec![0.0; (seconds * RATE as f64) as usize]
    }

    fn audio(parts: &[Vec<f32>]) -> AudioData {
        AudioData {
            samples: parts.concat(),
            sample_rate: RATE,
        }
    }

    #[test]
    fn test_long_pause_switches_speaker() {
        let audio = audio(&[tone(1.5), silence(3.0), tone(1.5), silence(2.5), tone(1.0)]);
        let turns = detect_turns(&audio, &PauseOptions::default());

        let speakers: Vec<&str> = turns.iter().map(|t| t.speaker_id.as_str()).collect();
        assert_eq!(speakers, vec!["SPEAKER_00", "SPEAKER_01", "SPEAKER_00"]);
        assert!((turns[1].start - 4.5).abs() < 0.05);
    }

    #[test]
    fn test_short_pause_is_bridged() {
        let audio = audio(&[tone(1.0), silence(0.3), tone(1.0)]);
        let turns = detect_turns(&audio, &PauseOptions::default());

        assert_eq!(turns.len(), 1);
        assert!((turns[0].end - 2.3).abs() < 0.05);
    }

    #[test]
    fn test_medium_pause_keeps_speaker() {
        let audio = audio(&[tone(1.0), silence(1.0), tone(1.0)]);
        let turns = detect_turns(&audio, &PauseOptions::default());

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker_id, turns[1].speaker_id);
    }

    #[test]
    fn test_speech_yields_turns() {
        let audio = audio(&[silence(0.5), tone(1.0), silence(0.5)]);
        assert!(!detect_turns(&audio, &PauseOptions::default()).is_empty());
    }

    #[test]
    fn test_silence_and_blips_yield_nothing() {
        assert!(detect_turns(&audio(&[silence(2.0)]), &PauseOptions::default()).is_empty());
        assert!(detect_turns(&audio(&[silence(1.0), tone(0.05), silence(1.0)]), &PauseOptions::default())
            .is_empty());
        assert!(speech_regions(&[], RATE, &PauseOptions::default()).is_empty());
    }

    #[test]
    fn test_turns_are_ordered_and_well_formed() {
        let audio = audio(&[tone(0.7), silence(2.2), tone(0.4), silence(0.6), tone(0.9)]);
        let turns = detect_turns(&audio, &PauseOptions::default());

        assert!(turns.iter().all(|t| t.end > t.start));
        assert!(turns.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[tokio::test]
    async fn test_diarize_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [tone(1.0), silence(3.0), tone(1.0)].concat() {
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let turns = PauseDiarizer::default().diarize(&path).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_ne!(turns[0].speaker_id, turns[1].speaker_id);
    }

    #[tokio::test]
    async fn test_diarize_missing_file() {
        let err = PauseDiarizer::default()
            .diarize(Path::new("/nonexistent/session.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, DiarizationError::UnreadableAudio(_)));
    }
}
