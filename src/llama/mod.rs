use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod loader;
pub mod server;

pub use loader::{candidate_paths, locate_model, EngineLoader, LoadedEngine, ModelLoader};
pub use server::{HealthStatus, LlamaServer};

/**
 * Inference engine boundary
 *
 * The chat controller only ever sees `dyn InferenceEngine`. The production
 * backend is a llama.cpp server on the loopback interface; tests plug in
 * scripted engines.
 */

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Inference runtime unavailable: {reason}")]
    RuntimeUnavailable { reason: String },
    #[error("Model file not found. Please ensure the model is in the 'model' folder. Searched: {searched}")]
    ModelNotFound { searched: String },
    #[error("Failed to load model: {reason}")]
    LoadFailed { reason: String },
    #[error("Engine is not loaded or has been disposed")]
    EngineNotLoaded,
    #[error("Text generation failed: {reason}")]
    GenerationFailed { reason: String },
    #[error("Invalid input parameters: {details}")]
    InvalidInput { details: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Timed out after {secs}s")]
    Timeout { secs: u64 },
}

pub type Result<T> = std::result::Result<T, LLMError>;

pub const STOP_SEQUENCES: [&str; 3] = ["User:", "\n\nUser:", "Assistant:"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            repeat_penalty: 1.2,
            frequency_penalty: 0.3,
            presence_penalty: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub stop: Vec<String>,
    pub sampling: SamplingParams,
}

impl GenerationConfig {
    pub fn for_length(length: crate::config::ResponseLength, sampling: SamplingParams) -> Self {
        Self {
            max_tokens: length.token_budget(),
            sampling,
            ..Self::default()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 600,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            sampling: SamplingParams::default(),
        }
    }
}

#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Completes `prompt`. The returned text is already cut at the first
    /// stop string and trimmed.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Cuts `text` at the earliest occurrence of any stop string.
pub fn truncate_at_stop<'a, S: AsRef<str>>(text: &'a str, stops: &[S]) -> &'a str {
    let cut = stops
        .iter()
        .filter_map(|stop| {
            let stop = stop.as_ref();
            if stop.is_empty() {
                None
            } else {
                text.find(stop)
            }
        })
        .min()
        .unwrap_or(text.len());
    &text[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseLength;

    #[test]
    fn truncates_at_the_earliest_stop() {
        let stops = STOP_SEQUENCES;
        assert_eq!(
            truncate_at_stop("Use TLS.\nAssistant: more\nUser: again", &stops),
            "Use TLS.\n"
        );
        assert_eq!(truncate_at_stop("no stops here", &stops), "no stops here");
        assert_eq!(truncate_at_stop("User: right away", &stops), "");
    }

    #[test]
    fn empty_stop_strings_are_ignored() {
        assert_eq!(truncate_at_stop("abc", &[""]), "abc");
    }

    #[test]
    fn generation_config_follows_response_length() {
        let config = GenerationConfig::for_length(ResponseLength::Short, SamplingParams::default());
        assert_eq!(config.max_tokens, 300);
        assert_eq!(config.stop, vec!["User:", "\n\nUser:", "Assistant:"]);

        let config = GenerationConfig::for_length(ResponseLength::Unrecognized, SamplingParams::default());
        assert_eq!(config.max_tokens, 600);
    }

    #[test]
    fn sampling_defaults() {
        let s = SamplingParams::default();
        assert_eq!(s.top_k, 40);
        assert!((s.temperature - 0.7).abs() < f32::EPSILON);
        assert!((s.top_p - 0.9).abs() < f32::EPSILON);
        assert!((s.repeat_penalty - 1.2).abs() < f32::EPSILON);
        assert!((s.frequency_penalty - 0.3).abs() < f32::EPSILON);
        assert!((s.presence_penalty - 0.3).abs() < f32::EPSILON);
    }
}
