//! Audio decoding to mono f32 samples

use std::fs::File;
use std::path::Path;

use hound::WavReader;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

/// Audio decoding errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Resample error: {0}")]
    Resample(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Decoded mono samples
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Mono samples in [-1, 1]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioData {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decodes audio files into mono samples at a fixed rate
pub struct AudioProcessor {
    target_sample_rate: u32,
}

impl AudioProcessor {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Decode a file to mono samples at the target rate
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<AudioData, AudioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let (mono, sample_rate) = match extension_of(path).as_deref() {
            Some("wav") => load_wav(path)?,
            Some("mp3" | "m4a" | "mp4" | "aac" | "flac" | "ogg") => load_symphonia(path)?,
            Some(ext) => return Err(AudioError::UnsupportedFormat(ext.to_string())),
            None => return Err(AudioError::UnsupportedFormat("unknown".to_string())),
        };

        let samples = if sample_rate != self.target_sample_rate {
            debug!("Resampling {} Hz -> {} Hz", sample_rate, self.target_sample_rate);
            resample(&mono, sample_rate, self.target_sample_rate)?
        } else {
            mono
        };

        Ok(AudioData {
            samples,
            sample_rate: self.target_sample_rate,
        })
    }
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new(16000)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn probe(path: &Path) -> Result<symphonia::core::probe::ProbeResult, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::Decode(format!("cannot probe format: {}", e)))
}

fn load_wav(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
    };

    Ok((downmix(samples, spec.channels as usize), spec.sample_rate))
}

fn load_symphonia(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut format = probe(path)?.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no audio track".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("cannot create decoder: {}", e)))?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Stopping at unreadable packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    Ok((downmix(interleaved, channels), sample_rate))
}

/// Average interleaved channels into one
fn downmix(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    use rubato::{FftFixedInOut, Resampler};

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, 1024, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let chunk_size = resampler.input_frames_next();
    let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let mut padded = chunk.to_vec();
        let valid = padded.len();
        padded.resize(chunk_size, 0.0);

        let input = vec![padded];
        let result = resampler
            .process(&input, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;

        // Zero padding on the tail chunk is trimmed from the output
        let keep = if valid == chunk_size {
            result[0].len()
        } else {
            ((valid as f64 * ratio) as usize).min(result[0].len())
        };
        output.extend_from_slice(&result[0][..keep]);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_wav_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 16000, 2, &[16384, 0, 16384, 0]);

        let audio = AudioProcessor::new(16000).load(&path).unwrap();
        assert_eq!(audio.samples.len(), 2);
        assert!((audio.samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_resample_changes_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("8k.wav");
        write_wav(&path, 8000, 1, &vec![1000i16; 8000]);

        let audio = AudioProcessor::new(16000).load(&path).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        let expected = 16000.0;
        assert!((audio.samples.len() as f64 - expected).abs() < 1100.0);
    }

    #[test]
    fn test_missing_and_unsupported() {
        let processor = AudioProcessor::default();
        assert!(matches!(
            processor.load("/nonexistent/file.wav"),
            Err(AudioError::FileNotFound(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(processor.load(&path), Err(AudioError::UnsupportedFormat(_))));
    }
}
