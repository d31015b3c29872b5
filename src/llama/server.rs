//! Client for a llama.cpp HTTP server (`/completion`, `/health`).

use super::{truncate_at_stop, GenerationConfig, InferenceEngine, LLMError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ready,
    Loading,
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repeat_penalty: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stop: &'a [String],
    stream: bool,
    cache_prompt: bool,
}

impl<'a> CompletionRequest<'a> {
    fn new(prompt: &'a str, config: &'a GenerationConfig) -> Self {
        let s = &config.sampling;
        Self {
            prompt,
            n_predict: config.max_tokens,
            temperature: s.temperature,
            top_p: s.top_p,
            top_k: s.top_k,
            repeat_penalty: s.repeat_penalty,
            frequency_penalty: s.frequency_penalty,
            presence_penalty: s.presence_penalty,
            stop: &config.stop,
            stream: false,
            cache_prompt: true,
        }
    }
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    content: String,
    #[serde(default)]
    tokens_predicted: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LlamaServer {
    client: Client,
    base: Url,
}

impl LlamaServer {
    /// Only a connect timeout is set; generation time is governed by the caller.
    pub fn new(base: Url) -> Result<Self> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| LLMError::InvalidInput {
            details: format!("bad endpoint path '{}': {}", path, e),
        })
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.endpoint("health")?).send().await?;
        match response.status() {
            StatusCode::OK => Ok(HealthStatus::Ready),
            StatusCode::SERVICE_UNAVAILABLE => Ok(HealthStatus::Loading),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(LLMError::LoadFailed {
                    reason: format!("health check returned {}: {}", status, body),
                })
            }
        }
    }
}

#[async_trait]
impl InferenceEngine for LlamaServer {
    #[instrument(skip_all, fields(prompt_chars = prompt.len(), max_tokens = config.max_tokens))]
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(LLMError::InvalidInput {
                details: "Empty prompt provided".to_string(),
            });
        }

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint("completion")?)
            .json(&CompletionRequest::new(prompt, config))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LLMError::RuntimeUnavailable {
                        reason: format!("unable to reach {}", self.base),
                    }
                } else {
                    LLMError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                503 => LLMError::EngineNotLoaded,
                400 => LLMError::InvalidInput { details: error_text },
                _ => LLMError::GenerationFailed {
                    reason: format!("HTTP error {}: {}", status, error_text),
                },
            });
        }

        let completion: CompletionResponse = response.json().await?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            tokens = completion.tokens_predicted,
            "Completion received"
        );

        Ok(truncate_at_stop(&completion.content, &config.stop)
            .trim()
            .to_string())
    }

    fn describe(&self) -> String {
        format!("llama.cpp server at {}", self.base)
    }
}
