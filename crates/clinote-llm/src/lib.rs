//! LLM integration for clinote
//!
//! Talks to a local Ollama server to classify speaker roles from their
//! speaking profiles. Nothing leaves the machine.

pub mod error;
pub mod ollama;
pub mod prompts;
pub mod provider;

pub use error::LlmError;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use prompts::{build_role_prompt, extract_json_object, SpeakerProfile};
pub use provider::{LlmProvider, LocalLlmProvider};
