//! Model cache commands

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};

use clinote_models::{get_model, ModelManager, DIARIZATION_MODELS};

#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List known models and whether they are cached
    List,

    /// Download models into the cache
    Download {
        /// Model ids, see `clinote models list`
        ids: Vec<String>,

        /// Download both neural diarization models
        #[arg(long)]
        diarization: bool,
    },

    /// Delete cached models
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Print the cache directory, or the cached path of a model
    Path { id: Option<String> },
}

pub async fn run(command: ModelsCommand, manager: &ModelManager) -> Result<()> {
    match command {
        ModelsCommand::List => {
            for (model, downloaded) in manager.list() {
                println!(
                    "{} {:<20} {:>8}  {}",
                    if downloaded { "*" } else { " " },
                    model.id,
                    model.size_string(),
                    model.description
                );
            }
            println!("\n* = downloaded to {}", manager.cache_directory().display());
            Ok(())
        }
        ModelsCommand::Download { mut ids, diarization } => {
            if diarization {
                ids.extend(DIARIZATION_MODELS.iter().map(|m| m.id.clone()));
            }
            if ids.is_empty() {
                bail!("Nothing to download. Pass model ids or --diarization.");
            }
            for id in ids {
                download(manager, &id).await?;
            }
            Ok(())
        }
        ModelsCommand::Remove { ids } => {
            for id in ids {
                manager
                    .delete_by_id(&id)
                    .await
                    .with_context(|| format!("Cannot remove {}", id))?;
                println!("Removed {}", id);
            }
            Ok(())
        }
        ModelsCommand::Path { id: None } => {
            println!("{}", manager.cache_directory().display());
            Ok(())
        }
        ModelsCommand::Path { id: Some(id) } => {
            println!("{}", manager.resolve(&id)?.display());
            Ok(())
        }
    }
}

async fn download(manager: &ModelManager, id: &str) -> Result<()> {
    let model = get_model(id).with_context(|| format!("Unknown model: {}", id))?;

    let bar = ProgressBar::new(model.size_bytes);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("=> "),
    );
    bar.set_message(model.name.clone());

    let progress = bar.clone();
    let path = manager
        .download(&model, move |p| {
            progress.set_length(p.total_bytes);
            progress.set_position(p.bytes_downloaded);
        })
        .await
        .with_context(|| format!("Downloading {} failed", model.id))?;

    bar.finish_and_clear();
    println!("{} -> {}", model.id, path.display());
    Ok(())
}
