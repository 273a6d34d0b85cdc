//! Ollama status command

use anyhow::{bail, Result};
use clinote_llm::{LlmProvider, OllamaConfig, OllamaProvider};

pub async fn run(url: &str) -> Result<()> {
    let provider = OllamaProvider::with_config(OllamaConfig {
        base_url: url.to_string(),
        ..Default::default()
    });

    if !provider.is_available().await {
        bail!("Ollama is not reachable at {}. Start it with `ollama serve`.", url);
    }

    let models = provider.list_models().await?;
    println!("Ollama is running at {}", url);
    if models.is_empty() {
        println!("No models installed. Try `ollama pull {}`.", provider.model());
    }
    for model in models {
        println!("  {}", model);
    }
    Ok(())
}
