//! Model discovery and runtime start-up.

use super::{HealthStatus, InferenceEngine, LLMError, LlamaServer, Result};
use crate::config::EngineSettings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Places the model file is looked for, in priority order, without duplicates.
pub fn candidate_paths(
    model_dir: Option<&Path>,
    exe_dir: Option<&Path>,
    cwd: Option<&Path>,
    model_file: &str,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let base = model_dir.or(exe_dir);
    if let Some(base) = base {
        paths.push(base.join("model").join(model_file));
        paths.push(base.join(model_file));
    }
    if let Some(exe_dir) = exe_dir {
        paths.push(exe_dir.join("model").join(model_file));
    }
    if let Some(cwd) = cwd {
        paths.push(cwd.join("model").join(model_file));
    }
    let mut unique = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}

pub fn locate_model(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| LLMError::ModelNotFound {
            searched: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// A ready engine plus whatever must stay alive alongside it.
pub struct LoadedEngine {
    pub engine: Arc<dyn InferenceEngine>,
    pub model_path: Option<PathBuf>,
    /// Spawned runtime; dropping it kills the process.
    pub runtime: Option<Child>,
}

impl LoadedEngine {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            model_path: None,
            runtime: None,
        }
    }
}

impl std::fmt::Debug for LoadedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedEngine")
            .field("engine", &self.engine.describe())
            .field("model_path", &self.model_path)
            .field("runtime_pid", &self.runtime.as_ref().and_then(|c| c.id()))
            .finish()
    }
}

#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<LoadedEngine>;
}

/// Finds the model, starts the runtime when one is configured, and waits
/// for it to report healthy.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    settings: EngineSettings,
}

impl ModelLoader {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let cwd = std::env::current_dir().ok();
        candidate_paths(
            self.settings.model_dir.as_deref(),
            exe_dir.as_deref(),
            cwd.as_deref(),
            &self.settings.model_file,
        )
    }

    fn spawn_runtime(&self, binary: &Path, model_path: &Path) -> Result<Child> {
        let port = self.settings.port().ok_or_else(|| LLMError::RuntimeUnavailable {
            reason: format!("no port in endpoint {}", self.settings.endpoint),
        })?;

        let args = vec![
            "-m".to_string(),
            model_path.display().to_string(),
            "-c".to_string(),
            self.settings.context_size.to_string(),
            "-t".to_string(),
            self.settings.threads.to_string(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            port.to_string(),
        ];

        info!(
            binary = %binary.display(),
            model = %model_path.display(),
            port = port,
            "Spawning inference runtime"
        );

        Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LLMError::RuntimeUnavailable {
                reason: format!("failed to start {}: {}", binary.display(), e),
            })
    }

    async fn wait_until_ready(&self, server: &LlamaServer, runtime: &mut Option<Child>) -> Result<()> {
        let deadline = Instant::now() + self.settings.load_timeout();
        let mut last_error: Option<LLMError> = None;

        loop {
            if let Some(child) = runtime.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(LLMError::LoadFailed {
                        reason: format!("runtime exited during start-up ({})", status),
                    });
                }
            }

            match server.health().await {
                Ok(HealthStatus::Ready) => return Ok(()),
                Ok(HealthStatus::Loading) => {
                    debug!("Runtime is still loading the model");
                    last_error = None;
                }
                Err(e) => {
                    debug!(error = %e, "Runtime not reachable yet");
                    last_error = Some(e);
                }
            }

            if Instant::now() >= deadline {
                return Err(match last_error {
                    Some(LLMError::Http(e)) if e.is_connect() => LLMError::RuntimeUnavailable {
                        reason: format!("nothing is listening at {}", server.base()),
                    },
                    Some(other) => other,
                    None => LLMError::LoadFailed {
                        reason: format!(
                            "model still loading after {}s",
                            self.settings.load_timeout_secs
                        ),
                    },
                });
            }

            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl EngineLoader for ModelLoader {
    async fn load(&self) -> Result<LoadedEngine> {
        let url = self
            .settings
            .endpoint_url()
            .map_err(|e| LLMError::RuntimeUnavailable {
                reason: e.to_string(),
            })?;
        let server = LlamaServer::new(url)?;

        // Without a runtime binary we attach to an already running server,
        // which owns its own model file.
        let (model_path, mut runtime) = match &self.settings.runtime_binary {
            Some(binary) => {
                let model_path = locate_model(&self.candidates())?;
                let child = self.spawn_runtime(binary, &model_path)?;
                (Some(model_path), Some(child))
            }
            None => {
                warn!(
                    endpoint = %server.base(),
                    "No runtime binary configured, attaching to an existing server"
                );
                (None, None)
            }
        };

        self.wait_until_ready(&server, &mut runtime).await?;
        info!(engine = %server.describe(), "Inference engine ready");

        Ok(LoadedEngine {
            engine: Arc::new(server),
            model_path,
            runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MODEL: &str = "qwen1.5-1.8b-chat-q4_k_m.gguf";

    #[test]
    fn candidate_order_prefers_model_dir() {
        let paths = candidate_paths(
            Some(Path::new("/models")),
            Some(Path::new("/app")),
            Some(Path::new("/work")),
            MODEL,
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/models/model").join(MODEL),
                PathBuf::from("/models").join(MODEL),
                PathBuf::from("/app/model").join(MODEL),
                PathBuf::from("/work/model").join(MODEL),
            ]
        );
    }

    #[test]
    fn candidates_are_deduplicated() {
        let paths = candidate_paths(None, Some(Path::new("/app")), Some(Path::new("/app")), MODEL);
        assert_eq!(
            paths,
            vec![PathBuf::from("/app/model").join(MODEL), PathBuf::from("/app").join(MODEL)]
        );
    }

    #[test]
    fn locate_model_returns_first_existing() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("model");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(dir.path().join(MODEL), b"gguf").unwrap();

        let candidates = candidate_paths(Some(dir.path()), None, None, MODEL);
        assert_eq!(locate_model(&candidates).unwrap(), dir.path().join(MODEL));

        std::fs::write(model_dir.join(MODEL), b"gguf").unwrap();
        assert_eq!(locate_model(&candidates).unwrap(), model_dir.join(MODEL));
    }

    #[test]
    fn missing_model_lists_searched_paths() {
        let err = locate_model(&[PathBuf::from("/nowhere").join(MODEL)]).unwrap_err();
        match err {
            LLMError::ModelNotFound { searched } => assert!(searched.contains("/nowhere")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_runtime_fails_after_load_timeout() {
        let settings = EngineSettings {
            endpoint: "http://127.0.0.1:9".to_string(),
            load_timeout_secs: 0,
            ..EngineSettings::default()
        };
        let err = ModelLoader::new(settings).load().await.unwrap_err();
        assert!(matches!(
            err,
            LLMError::RuntimeUnavailable { .. } | LLMError::Http(_)
        ));
    }

    #[tokio::test]
    async fn missing_runtime_binary_is_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL), b"gguf").unwrap();
        let settings = EngineSettings {
            model_dir: Some(dir.path().to_path_buf()),
            runtime_binary: Some(dir.path().join("no-such-llama-server")),
            ..EngineSettings::default()
        };
        let err = ModelLoader::new(settings).load().await.unwrap_err();
        assert!(matches!(err, LLMError::RuntimeUnavailable { .. }));
    }
}
