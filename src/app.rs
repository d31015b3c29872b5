//! Start-up wiring: paths, stores and the chat controller.

use crate::chat::{AppState, ChatController, ChatHandle};
use crate::config::{AppPaths, EngineSettings, Settings, SettingsStore};
use crate::llama::{EngineLoader, ModelLoader};
use crate::memory::{MemoryStore, PersistentMemory};
use crate::storage::JsonDocument;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct AppBootstrap {
    pub paths: AppPaths,
    pub settings: Settings,
    pub engine: EngineSettings,
    pub persistent: PersistentMemory,
    settings_store: SettingsStore,
    memory_store: MemoryStore,
}

impl AppBootstrap {
    /// Settings and memory never fail to load; only unusable engine
    /// settings abort start-up.
    pub fn load(paths: AppPaths) -> Result<Self> {
        let settings_store = SettingsStore::new(JsonDocument::new(paths.settings_file()));
        let memory_store = MemoryStore::new(JsonDocument::new(paths.memory_file()));

        let settings = settings_store.load();
        let persistent = memory_store.load();
        let engine = EngineSettings::load(&paths.engine_file())
            .with_context(|| format!("Failed to load {}", paths.engine_file().display()))?;

        tracing::info!(
            "[Bootstrap] Settings loaded (theme: {:?}, response length: {:?}, endpoint: {})",
            settings.theme,
            settings.response_length,
            engine.endpoint
        );

        Ok(Self {
            paths,
            settings,
            engine,
            persistent,
            settings_store,
            memory_store,
        })
    }

    /// Starts the controller with the llama.cpp loader.
    pub fn start(self) -> (JoinHandle<()>, ChatHandle) {
        let loader = Arc::new(ModelLoader::new(self.engine.clone()));
        self.start_with(loader)
    }

    pub fn start_with(self, loader: Arc<dyn EngineLoader>) -> (JoinHandle<()>, ChatHandle) {
        let state = AppState::new(
            self.settings,
            self.persistent,
            self.engine.sampling.clone(),
            self.engine.generation_timeout(),
        );
        ChatController::spawn(state, self.settings_store, self.memory_store, loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatStatus;
    use crate::llama::{LLMError, LoadedEngine};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::tempdir;

    struct NoRuntime;

    #[async_trait]
    impl EngineLoader for NoRuntime {
        async fn load(&self) -> crate::llama::Result<LoadedEngine> {
            Err(LLMError::RuntimeUnavailable {
                reason: "not installed".into(),
            })
        }
    }

    #[test]
    fn load_reads_existing_files() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("rekon_config.json"),
            r#"{"theme": "light", "persistent_memory": true}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("rekon_memory.json"), r#"{"name": "Alex"}"#).unwrap();
        std::fs::write(dir.path().join("rekon_engine.toml"), "threads = 2\n").unwrap();

        let boot = AppBootstrap::load(AppPaths::at(dir.path())).unwrap();
        assert!(boot.settings.persistent_memory);
        assert_eq!(boot.persistent.get("name"), Some("Alex"));
        assert_eq!(boot.engine.threads, 2);
    }

    #[test]
    fn broken_engine_settings_abort_start_up() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("rekon_engine.toml"), "threads = [").unwrap();
        assert!(AppBootstrap::load(AppPaths::at(dir.path())).is_err());
    }

    #[tokio::test]
    async fn start_reports_a_missing_runtime() {
        let dir = tempdir().unwrap();
        let boot = AppBootstrap::load(AppPaths::at(dir.path())).unwrap();
        let (_task, handle) = boot.start_with(Arc::new(NoRuntime));

        for _ in 0..200 {
            let snapshot = handle.snapshot().await.unwrap();
            if snapshot.status == ChatStatus::Unavailable {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("load failure never reported");
    }
}
