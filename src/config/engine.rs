use crate::llama::SamplingParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

pub const ENV_ENGINE_URL: &str = "REKON_ENGINE_URL";
pub const ENV_MODEL_DIR: &str = "REKON_MODEL_DIR";
pub const ENV_RUNTIME_BIN: &str = "REKON_RUNTIME_BIN";

#[derive(Error, Debug)]
pub enum EngineConfigError {
    #[error("Failed to read engine settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid engine settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid engine endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// How to reach (and optionally launch) the local llama.cpp runtime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub endpoint: String,
    pub model_file: String,
    /// Extra directory searched first for the model file.
    pub model_dir: Option<PathBuf>,
    /// When set, the runtime is spawned by us and owned for the app's lifetime.
    pub runtime_binary: Option<PathBuf>,
    pub context_size: u32,
    pub threads: u32,
    pub load_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub sampling: SamplingParams,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            model_file: "qwen1.5-1.8b-chat-q4_k_m.gguf".to_string(),
            model_dir: None,
            runtime_binary: None,
            context_size: 4096,
            threads: 6,
            load_timeout_secs: 120,
            generation_timeout_secs: 180,
            sampling: SamplingParams::default(),
        }
    }
}

impl EngineSettings {
    /// Loads the optional TOML file, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, EngineConfigError> {
        let mut settings = Self::from_file(path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.endpoint_url()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No engine settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| EngineConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: EngineSettings =
            toml::from_str(&content).map_err(|source| EngineConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), "Loaded engine settings");
        Ok(settings)
    }

    /// `lookup` resolves a variable name; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = read(ENV_ENGINE_URL) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(dir) = read(ENV_MODEL_DIR) {
            self.model_dir = Some(PathBuf::from(dir));
        }
        if let Some(binary) = read(ENV_RUNTIME_BIN) {
            self.runtime_binary = Some(PathBuf::from(binary));
        }
    }

    pub fn endpoint_url(&self) -> Result<Url, EngineConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| EngineConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(EngineConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    /// Port the spawned runtime should listen on, taken from the endpoint.
    pub fn port(&self) -> Option<u16> {
        self.endpoint_url().ok().and_then(|url| url.port_or_known_default())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}
