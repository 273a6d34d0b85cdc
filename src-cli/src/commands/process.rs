//! Session processing command

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{error, info, warn};

use clinote_asr::{Language, WhisperProvider};
use clinote_core::{ExportPaths, Exporter, SessionResult};
use clinote_diarization::{DiarizationMode, PyannoteDiarizer};
use clinote_llm::{LlmProvider, OllamaProvider};
use clinote_models::{ModelManager, DEFAULT_WHISPER_MODEL};
use clinote_pipeline::{PipelineConfig, PipelineError, SessionPipeline};
use clinote_roles::{ConfidenceTier, DominantSpeakerRole};

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Audio files (wav, mp3, m4a, flac, ogg)
    #[arg(required = true)]
    audio: Vec<PathBuf>,

    /// Directory for JSON, transcript and subtitle files
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// JSON pipeline configuration file
    #[arg(short, long, env = "CLINOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Diarization mode: simple, neural or auto
    #[arg(long)]
    diarization: Option<DiarizationMode>,

    /// Whisper model id from `clinote models list`
    #[arg(long, env = "CLINOTE_WHISPER_MODEL", default_value = DEFAULT_WHISPER_MODEL)]
    whisper_model: String,

    /// Spoken language code, or "auto"
    #[arg(short, long)]
    language: Option<String>,

    /// Skip the language model role classification
    #[arg(long)]
    no_llm_enhancement: bool,

    #[arg(long, env = "CLINOTE_OLLAMA_URL")]
    ollama_url: Option<String>,

    #[arg(long, env = "CLINOTE_OLLAMA_MODEL")]
    ollama_model: Option<String>,

    /// Reject role classifications below this confidence: low, medium, high
    #[arg(long)]
    min_confidence: Option<ConfidenceTier>,

    /// Role of the speaker with the most speech: client or clinician
    #[arg(long)]
    dominant_role: Option<DominantSpeakerRole>,

    /// Sessions processed at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Also print each transcript to stdout
    #[arg(long)]
    print: bool,
}

pub async fn run(args: ProcessArgs, manager: &ModelManager) -> Result<()> {
    let config = build_config(&args)?;

    let transcriber = load_transcriber(manager, &args.whisper_model, &config).await?;
    let neural = load_neural(manager, &config);
    let llm = if config.roles.contextual_enabled {
        Some(load_llm(&config).await?)
    } else {
        None
    };

    let pipeline = SessionPipeline::new(&config, transcriber, neural, llm);
    let jobs = args.jobs.unwrap_or_else(|| config.concurrency());
    let results = pipeline.process_all(&args.audio, jobs).await;

    let total = results.len();
    let failed = export_all(results, &args.output, args.print);

    if failed > 0 {
        bail!("{} of {} sessions failed", failed, total);
    }
    Ok(())
}

/// Export and report every processed session.
///
/// Returns how many sessions failed, in processing or in export. A failure
/// never stops the remaining sessions from being written.
fn export_all(
    results: Vec<(PathBuf, Result<SessionResult, PipelineError>)>,
    output: &Path,
    print: bool,
) -> usize {
    let mut failed = 0;
    for (path, result) in results {
        let session = match result {
            Ok(session) => session,
            Err(e) => {
                failed += 1;
                error!("{}: {}", path.display(), e);
                continue;
            }
        };

        match Exporter::write_session(&session, output) {
            Ok(paths) => {
                report(&session, &paths);
                if print {
                    println!("\n{}\n", Exporter::format_transcript(&session));
                }
            }
            Err(e) => {
                failed += 1;
                error!(
                    "{}: cannot write results to {}: {}",
                    path.display(),
                    output.display(),
                    e
                );
            }
        }
    }
    failed
}

/// File configuration with command-line overrides applied
fn build_config(args: &ProcessArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Cannot load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(mode) = args.diarization {
        config.diarization_mode = mode;
    }
    if let Some(language) = &args.language {
        if !Language::is_supported(language) {
            bail!("Unsupported language: {}", language);
        }
        config.transcription.language = language.clone();
    }
    if args.no_llm_enhancement {
        config.roles.contextual_enabled = false;
    }
    if let Some(tier) = args.min_confidence {
        config.roles.min_confidence = Some(tier);
    }
    if let Some(role) = args.dominant_role {
        config.roles.dominant_speaker_role = role;
    }
    if let Some(url) = &args.ollama_url {
        config.ollama.base_url = url.clone();
    }
    if let Some(model) = &args.ollama_model {
        config.ollama.model = model.clone();
    }

    Ok(config)
}

async fn load_transcriber(
    manager: &ModelManager,
    model_id: &str,
    config: &PipelineConfig,
) -> Result<WhisperProvider> {
    let path = manager
        .resolve(model_id)
        .with_context(|| format!("Whisper model {} is required for transcription", model_id))?;

    let mut provider = WhisperProvider::new().with_options(config.transcription.clone());
    provider
        .load_model(&path.to_string_lossy())
        .await
        .context("Cannot load the Whisper model")?;
    Ok(provider)
}

/// Neural diarizer when its models are cached; pause-based otherwise
fn load_neural(manager: &ModelManager, config: &PipelineConfig) -> Option<PyannoteDiarizer> {
    if config.diarization_mode == DiarizationMode::Simple {
        return None;
    }

    let paths = match manager.resolve_diarization_models() {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Neural diarization unavailable: {}", e);
            return None;
        }
    };

    let mut diarizer = PyannoteDiarizer::new().with_options(config.neural.clone());
    match diarizer.load_models(&paths.segmentation, &paths.embedding) {
        Ok(()) => Some(diarizer),
        Err(e) => {
            warn!("Neural diarization unavailable: {}", e);
            None
        }
    }
}

async fn load_llm(config: &PipelineConfig) -> Result<OllamaProvider> {
    let provider =
        OllamaProvider::with_config(config.ollama.clone()).with_timeout(config.roles.timeout())?;

    if provider.is_available().await {
        info!("Using Ollama model {} for role classification", provider.model());
        if let Ok(models) = provider.list_models().await {
            if !has_model(&models, provider.model()) {
                warn!(
                    "Ollama model {} is not installed; run `ollama pull {}`",
                    provider.model(),
                    provider.model()
                );
            }
        }
    } else {
        warn!(
            "Ollama is not reachable at {}; roles will come from speaking time",
            provider.base_url()
        );
    }
    Ok(provider)
}

/// Ollama lists untagged models as `name:latest`
fn has_model(installed: &[String], model: &str) -> bool {
    installed
        .iter()
        .any(|m| m == model || m.strip_suffix(":latest") == Some(model))
}

fn report(session: &SessionResult, paths: &ExportPaths) {
    let metadata = &session.metadata;
    let with_reason = |method: String, reason: &Option<String>| match reason {
        Some(reason) => format!("{} (fallback: {})", method, reason),
        None => method,
    };

    println!("{}", session.audio_path);
    println!(
        "  language {}, {:.1}s, {} segments",
        session.language,
        session.duration,
        session.segments.len()
    );
    println!(
        "  diarization: {}",
        with_reason(
            metadata.diarization_method_used.to_string(),
            &metadata.diarization_fallback_reason
        )
    );
    println!(
        "  role resolution: {}",
        with_reason(
            metadata.role_resolution_method_used.to_string(),
            &metadata.role_resolution_fallback_reason
        )
    );
    for (speaker_id, role) in session.roles.iter() {
        println!("    {} -> {}", speaker_id, role);
    }
    println!("  json: {}", paths.json.display());
    println!("  transcript: {}", paths.transcript.display());
    println!("  subtitles: {}", paths.subtitles.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use clinote_core::{
        DiarizationMethod, RoleAssignment, RoleResolutionMethod, SessionMetadata,
    };

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ProcessArgs,
    }

    fn parse(argv: &[&str]) -> ProcessArgs {
        TestCli::try_parse_from(std::iter::once("clinote").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "session.wav",
            "--diarization",
            "simple",
            "--no-llm-enhancement",
            "--dominant-role",
            "clinician",
            "--language",
            "es",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.diarization_mode, DiarizationMode::Simple);
        assert!(!config.roles.contextual_enabled);
        assert_eq!(config.roles.dominant_speaker_role, DominantSpeakerRole::Clinician);
        assert_eq!(config.transcription.language, "es");
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["a.wav", "b.mp3"]);
        assert_eq!(args.audio.len(), 2);
        assert_eq!(args.output, PathBuf::from("output"));

        let config = build_config(&args).unwrap();
        assert_eq!(config.diarization_mode, DiarizationMode::Auto);
        assert!(config.roles.contextual_enabled);
    }

    fn session(audio_path: &str) -> SessionResult {
        SessionResult {
            audio_path: audio_path.to_string(),
            language: "en".to_string(),
            duration: 12.0,
            segments: vec![],
            roles: RoleAssignment::empty(),
            speakers: vec![],
            metadata: SessionMetadata {
                diarization_method_used: DiarizationMethod::Simple,
                role_resolution_method_used: RoleResolutionMethod::Heuristic,
                diarization_fallback_reason: None,
                role_resolution_fallback_reason: None,
                processed_at: chrono::Utc::now(),
            },
        }
    }

    #[test]
    fn test_export_all_counts_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![
            (PathBuf::from("a/session.wav"), Ok(session("a/session.wav"))),
            (
                PathBuf::from("missing.wav"),
                Err(PipelineError::AudioNotFound(PathBuf::from("missing.wav"))),
            ),
            (PathBuf::from("b/session.wav"), Ok(session("b/session.wav"))),
        ];

        assert_eq!(export_all(results, dir.path(), false), 1);
        // Both same-stem sessions written, three files each
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 6);
    }

    #[test]
    fn test_export_failure_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("output");
        std::fs::write(&not_a_dir, "occupied").unwrap();

        let results = vec![
            (PathBuf::from("one.wav"), Ok(session("one.wav"))),
            (PathBuf::from("two.wav"), Ok(session("two.wav"))),
        ];
        assert_eq!(export_all(results, &not_a_dir, false), 2);
    }

    #[test]
    fn test_has_model() {
        let installed = vec!["llama3.2:latest".to_string(), "qwen2.5:7b".to_string()];
        assert!(has_model(&installed, "llama3.2"));
        assert!(has_model(&installed, "qwen2.5:7b"));
        assert!(!has_model(&installed, "qwen2.5"));
        assert!(!has_model(&[], "llama3.2"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(TestCli::try_parse_from(["clinote", "a.wav", "--diarization", "magic"]).is_err());
        assert!(TestCli::try_parse_from(["clinote"]).is_err());

        let args = parse(&["a.wav", "--language", "xx"]);
        assert!(build_config(&args).is_err());
    }
}
