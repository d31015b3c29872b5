//! One generation request, run off the owner task.

use super::notices;
use crate::llama::{GenerationConfig, InferenceEngine, LLMError};
use crate::postprocessing::PostProcessor;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// Post-processed reply; the only outcome recorded into session memory.
    Reply(String),
    TimedOut(String),
    Failed(String),
    ModelNotLoaded,
}

impl GenerationOutcome {
    pub fn text(&self) -> &str {
        match self {
            GenerationOutcome::Reply(text)
            | GenerationOutcome::TimedOut(text)
            | GenerationOutcome::Failed(text) => text,
            GenerationOutcome::ModelNotLoaded => notices::MODEL_NOT_LOADED,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, GenerationOutcome::Reply(_))
    }
}

/// Calls the engine and classifies the result.
///
/// The timeout is checked after the call returns and never interrupts it.
pub async fn run_generation(
    engine: Arc<dyn InferenceEngine>,
    prompt: &str,
    config: &GenerationConfig,
    timeout: Duration,
) -> GenerationOutcome {
    let start = Instant::now();
    let result = engine.generate(prompt, config).await;
    let elapsed = start.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;

    match result {
        Ok(_) if elapsed > timeout => {
            warn!(elapsed_ms, "Generation finished past the timeout");
            GenerationOutcome::TimedOut(notices::TOOK_TOO_LONG.to_string())
        }
        Ok(raw) => {
            info!(elapsed_ms, reply_chars = raw.len(), "Generation finished");
            GenerationOutcome::Reply(PostProcessor::for_generation().process(&raw))
        }
        Err(LLMError::EngineNotLoaded) => {
            warn!(elapsed_ms, "Engine reported no model loaded");
            GenerationOutcome::ModelNotLoaded
        }
        Err(e) if elapsed > timeout => {
            warn!(elapsed_ms, error = %e, "Generation failed past the timeout");
            GenerationOutcome::TimedOut(notices::timed_out(elapsed.as_secs()))
        }
        Err(e) => {
            warn!(elapsed_ms, error = %e, "Generation failed");
            GenerationOutcome::Failed(notices::engine_error(&e))
        }
    }
}
