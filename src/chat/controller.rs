//! The owner task. Every state change arrives as a [`ChatCommand`].
//!
//! Background work (model loading, generation) runs on its own task and
//! reports back through the same channel, so `AppState` has exactly one
//! writer.

use super::generation::{run_generation, GenerationOutcome};
use super::state::{AppState, ChatSnapshot, PendingTurn};
use super::{ChatError, ChatEvent};
use crate::config::{SettingChange, Settings, SettingsStore};
use crate::llama::{EngineLoader, LLMError, LoadedEngine};
use crate::memory::MemoryStore;
use crate::preprocessing::QuickCommand;
use crate::transcript::TranscriptEntry;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

pub enum ChatCommand {
    Submit {
        text: String,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    QuickCommand {
        command: QuickCommand,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    ClearChat {
        reply: oneshot::Sender<()>,
    },
    ClearMemory {
        reply: oneshot::Sender<()>,
    },
    Remember {
        key: String,
        value: String,
        reply: oneshot::Sender<()>,
    },
    Forget {
        key: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Export {
        dir: PathBuf,
        reply: oneshot::Sender<Result<PathBuf, ChatError>>,
    },
    UpdateSetting {
        change: SettingChange,
        reply: oneshot::Sender<Settings>,
    },
    Snapshot {
        reply: oneshot::Sender<ChatSnapshot>,
    },
    EngineLoaded(Result<LoadedEngine, LLMError>),
    GenerationFinished {
        request_id: Uuid,
        user_text: String,
        outcome: GenerationOutcome,
    },
}

pub struct ChatController {
    state: AppState,
    settings_store: SettingsStore,
    memory_store: MemoryStore,
    commands: mpsc::WeakSender<ChatCommand>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatController {
    /// Starts the owner task and the one-off model load.
    ///
    /// The task ends once every [`ChatHandle`] is dropped.
    pub fn spawn(
        state: AppState,
        settings_store: SettingsStore,
        memory_store: MemoryStore,
        loader: Arc<dyn EngineLoader>,
    ) -> (JoinHandle<()>, ChatHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let events = broadcast::channel(EVENT_CAPACITY).0;

        let mut controller = ChatController {
            state,
            settings_store,
            memory_store,
            commands: tx.downgrade(),
            events: events.clone(),
        };

        let loading = controller.state.notice(super::notices::LOADING_MODEL);
        controller.emit(ChatEvent::EntryAdded { entry: loading });
        controller.spawn_loader(loader);

        let task = tokio::spawn(controller.run(rx));
        (task, ChatHandle { commands: tx, events })
    }

    async fn run(mut self, mut rx: mpsc::Receiver<ChatCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        info!("Chat controller stopped");
    }

    fn handle(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Submit { text, reply } => {
                let _ = reply.send(self.submit(&text));
            }
            ChatCommand::QuickCommand { command, reply } => {
                let result = self
                    .state
                    .quick_command_prompt(command)
                    .and_then(|prompt| self.submit(prompt));
                let _ = reply.send(result);
            }
            ChatCommand::ClearChat { reply } => {
                let notice = self.state.clear_chat();
                self.emit(ChatEvent::TranscriptCleared);
                self.emit(ChatEvent::EntryAdded { entry: notice });
                let _ = reply.send(());
            }
            ChatCommand::ClearMemory { reply } => {
                self.state.clear_memory();
                self.save_memory();
                info!("Memory cleared");
                let _ = reply.send(());
            }
            ChatCommand::Remember { key, value, reply } => {
                self.state.remember(key, value);
                self.save_memory();
                let _ = reply.send(());
            }
            ChatCommand::Forget { key, reply } => {
                let removed = self.state.forget(&key);
                if removed.is_some() {
                    self.save_memory();
                }
                let _ = reply.send(removed);
            }
            ChatCommand::Export { dir, reply } => {
                let result = self
                    .state
                    .transcript()
                    .export(&dir, Local::now())
                    .map_err(|e| ChatError::Export(e.to_string()));
                let _ = reply.send(result);
            }
            ChatCommand::UpdateSetting { change, reply } => {
                debug!(change = ?change, "Applying setting");
                let settings = self.state.apply_setting(change).clone();
                self.settings_store.persist(&settings);
                self.emit(ChatEvent::SettingsChanged {
                    settings: settings.clone(),
                });
                let _ = reply.send(settings);
            }
            ChatCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            ChatCommand::EngineLoaded(result) => {
                if let Err(e) = &result {
                    warn!(error = %e, "Model load failed");
                }
                let notice = self.state.engine_loaded(result);
                if self.state.owns_runtime() {
                    info!("Runtime process is owned by the chat controller");
                }
                self.emit_entry(notice);
            }
            ChatCommand::GenerationFinished {
                request_id,
                user_text,
                outcome,
            } => {
                debug!(%request_id, stored = outcome.is_reply(), "Applying generation result");
                match self.state.finish_turn(request_id, user_text, outcome) {
                    Some(entry) => self.emit_entry(entry),
                    None => {
                        debug!(%request_id, "Discarding result of a cleared chat");
                        self.emit_status();
                    }
                }
            }
        }
    }

    fn submit(&mut self, text: &str) -> Result<(), ChatError> {
        let pending = self.state.begin_turn(text)?;
        self.emit_entry(pending.user_entry.clone());
        self.spawn_generation(pending);
        Ok(())
    }

    fn spawn_loader(&self, loader: Arc<dyn EngineLoader>) {
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = loader.load().await;
            match commands.upgrade() {
                Some(tx) => {
                    let _ = tx.send(ChatCommand::EngineLoaded(result)).await;
                }
                None => debug!("Controller gone before the model finished loading"),
            }
        });
    }

    fn spawn_generation(&self, pending: PendingTurn) {
        let PendingTurn {
            request_id,
            user_text,
            prompt,
            config,
            engine,
            timeout,
            ..
        } = pending;
        let commands = self.commands.clone();
        let span = info_span!("generation", %request_id, prompt_chars = prompt.len());

        tokio::spawn(
            async move {
                let outcome = run_generation(engine, &prompt, &config, timeout).await;
                if let Some(tx) = commands.upgrade() {
                    let _ = tx
                        .send(ChatCommand::GenerationFinished {
                            request_id,
                            user_text,
                            outcome,
                        })
                        .await;
                }
            }
            .instrument(span),
        );
    }

    fn save_memory(&self) {
        if let Err(e) = self.memory_store.save(self.state.persistent()) {
            warn!(error = %e, "Failed to persist memory");
        }
    }

    fn emit_entry(&self, entry: TranscriptEntry) {
        self.emit(ChatEvent::EntryAdded { entry });
        self.emit_status();
    }

    fn emit_status(&self) {
        let status = self.state.status();
        self.emit(ChatEvent::StatusChanged {
            status,
            indicator: status.indicator(),
        });
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine; the UI may not be attached yet.
        let _ = self.events.send(event);
    }
}

/// Cloneable front door to the controller.
#[derive(Clone)]
pub struct ChatHandle {
    commands: mpsc::Sender<ChatCommand>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ChatCommand,
    ) -> Result<T, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| ChatError::ControllerStopped)?;
        rx.await.map_err(|_| ChatError::ControllerStopped)
    }

    /// Queues a message for generation. Returns once accepted, not once answered.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), ChatError> {
        let text = text.into();
        self.request(|reply| ChatCommand::Submit { text, reply }).await?
    }

    pub async fn quick_command(&self, command: QuickCommand) -> Result<(), ChatError> {
        self.request(|reply| ChatCommand::QuickCommand { command, reply })
            .await?
    }

    pub async fn clear_chat(&self) -> Result<(), ChatError> {
        self.request(|reply| ChatCommand::ClearChat { reply }).await
    }

    pub async fn clear_memory(&self) -> Result<(), ChatError> {
        self.request(|reply| ChatCommand::ClearMemory { reply }).await
    }

    pub async fn remember(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ChatError> {
        let (key, value) = (key.into(), value.into());
        self.request(|reply| ChatCommand::Remember { key, value, reply })
            .await
    }

    pub async fn forget(&self, key: impl Into<String>) -> Result<Option<String>, ChatError> {
        let key = key.into();
        self.request(|reply| ChatCommand::Forget { key, reply }).await
    }

    pub async fn export_chat(&self, dir: impl Into<PathBuf>) -> Result<PathBuf, ChatError> {
        let dir = dir.into();
        self.request(|reply| ChatCommand::Export { dir, reply }).await?
    }

    pub async fn update_setting(&self, change: SettingChange) -> Result<Settings, ChatError> {
        self.request(|reply| ChatCommand::UpdateSetting { change, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<ChatSnapshot, ChatError> {
        self.request(|reply| ChatCommand::Snapshot { reply }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }
}
