use super::generation::GenerationOutcome;
use super::{notices, ChatError};
use crate::config::{SettingChange, Settings};
use crate::llama::{GenerationConfig, InferenceEngine, LLMError, LoadedEngine, SamplingParams};
use crate::memory::{PersistentMemory, SessionMemory, Turn};
use crate::preprocessing::{build_prompt, Cleaner, PromptOptions, QuickCommand, SYSTEM_PROMPT};
use crate::transcript::{Speaker, SystemTag, TagStyle, Transcript, TranscriptEntry};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use uuid::Uuid;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum EngineStatus {
    Loading,
    Ready,
    Failed(String),
}

/// What the status bar shows.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    LoadingModel,
    Ready,
    Thinking,
    Unavailable,
}

impl ChatStatus {
    pub fn label(self) -> &'static str {
        match self {
            ChatStatus::LoadingModel => "Loading model...",
            ChatStatus::Ready => "Ready",
            ChatStatus::Thinking => "Generating response...",
            ChatStatus::Unavailable => "Model unavailable",
        }
    }

    /// Transient line shown under the transcript; never recorded in it.
    pub fn indicator(self) -> Option<Indicator> {
        match self {
            ChatStatus::Thinking => Some(Indicator {
                text: notices::THINKING,
                style: TagStyle::THINKING,
            }),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub text: &'static str,
    pub style: TagStyle,
}

/// Everything a generation task needs, detached from the state.
pub struct PendingTurn {
    pub request_id: Uuid,
    pub user_entry: TranscriptEntry,
    pub user_text: String,
    pub prompt: String,
    pub config: GenerationConfig,
    pub engine: Arc<dyn InferenceEngine>,
    pub timeout: Duration,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatSnapshot {
    pub status: ChatStatus,
    pub engine: EngineStatus,
    pub settings: Settings,
    pub entries: Vec<TranscriptEntry>,
    pub session_turns: Vec<Turn>,
    pub persistent: PersistentMemory,
    pub user_messages: usize,
    pub model_path: Option<PathBuf>,
}

/// All mutable chat state. Owned by the controller task only.
pub struct AppState {
    settings: Settings,
    session: SessionMemory,
    persistent: PersistentMemory,
    transcript: Transcript,
    engine_status: EngineStatus,
    engine: Option<Arc<dyn InferenceEngine>>,
    model_path: Option<PathBuf>,
    runtime: Option<Child>,
    sampling: SamplingParams,
    generation_timeout: Duration,
    in_flight: bool,
    /// Request whose result may still land in the chat. Cleared by
    /// `clear_chat` and `clear_memory` so late results are discarded.
    current_request: Option<Uuid>,
    user_messages: usize,
}

impl AppState {
    pub fn new(
        settings: Settings,
        persistent: PersistentMemory,
        sampling: SamplingParams,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            session: SessionMemory::new(settings.max_history),
            settings,
            persistent,
            transcript: Transcript::new(),
            engine_status: EngineStatus::Loading,
            engine: None,
            model_path: None,
            runtime: None,
            sampling,
            generation_timeout,
            in_flight: false,
            current_request: None,
            user_messages: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &SessionMemory {
        &self.session
    }

    pub fn persistent(&self) -> &PersistentMemory {
        &self.persistent
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn engine_status(&self) -> &EngineStatus {
        &self.engine_status
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn status(&self) -> ChatStatus {
        match self.engine_status {
            EngineStatus::Loading => ChatStatus::LoadingModel,
            EngineStatus::Failed(_) => ChatStatus::Unavailable,
            EngineStatus::Ready if self.in_flight => ChatStatus::Thinking,
            EngineStatus::Ready => ChatStatus::Ready,
        }
    }

    pub fn notice(&mut self, text: impl Into<String>) -> TranscriptEntry {
        self.push(Speaker::System(SystemTag::Notice), text)
    }

    fn push(&mut self, speaker: Speaker, text: impl Into<String>) -> TranscriptEntry {
        self.transcript
            .push(TranscriptEntry::new(speaker, text))
            .clone()
    }

    /// Records the engine load result and returns the notice to show.
    pub fn engine_loaded(&mut self, result: Result<LoadedEngine, LLMError>) -> TranscriptEntry {
        match result {
            Ok(loaded) => {
                self.engine = Some(loaded.engine);
                self.model_path = loaded.model_path;
                self.runtime = loaded.runtime;
                self.engine_status = EngineStatus::Ready;
                self.notice(notices::MODEL_LOADED)
            }
            Err(e) => {
                self.engine_status = EngineStatus::Failed(e.to_string());
                self.notice(notices::load_failed(&e))
            }
        }
    }

    /// Validates a submission, records the user entry and prepares the prompt.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn, ChatError> {
        let user_text = Cleaner::clean(text).map_err(|_| ChatError::EmptyMessage)?;

        let engine = match (&self.engine_status, &self.engine) {
            (EngineStatus::Ready, Some(engine)) => Arc::clone(engine),
            _ => return Err(ChatError::NotReady),
        };
        if self.in_flight {
            return Err(ChatError::Busy);
        }

        let prompt = build_prompt(
            SYSTEM_PROMPT,
            &self.persistent,
            &self.session,
            &user_text,
            &PromptOptions::from(&self.settings),
        );
        let config = GenerationConfig::for_length(self.settings.response_length, self.sampling.clone());

        let user_entry = self.push(Speaker::User, user_text.clone());
        self.user_messages += 1;
        self.in_flight = true;
        let request_id = Uuid::new_v4();
        self.current_request = Some(request_id);

        Ok(PendingTurn {
            request_id,
            user_entry,
            user_text,
            prompt,
            config,
            engine,
            timeout: self.generation_timeout,
        })
    }

    /// Applies a finished generation. Only replies enter session memory.
    ///
    /// Returns `None` when the chat was cleared while the request ran; the
    /// result is then dropped.
    pub fn finish_turn(
        &mut self,
        request_id: Uuid,
        user_text: String,
        outcome: GenerationOutcome,
    ) -> Option<TranscriptEntry> {
        self.in_flight = false;
        if self.current_request.take() != Some(request_id) {
            return None;
        }
        let entry = match outcome {
            GenerationOutcome::Reply(reply) => {
                if self.settings.session_memory {
                    self.session.push(Turn::new(user_text, reply.clone()));
                }
                self.push(Speaker::Assistant, reply)
            }
            GenerationOutcome::ModelNotLoaded => {
                self.push(Speaker::System(SystemTag::Error), notices::MODEL_NOT_LOADED)
            }
            GenerationOutcome::TimedOut(text) | GenerationOutcome::Failed(text) => {
                self.push(Speaker::Assistant, text)
            }
        };
        Some(entry)
    }

    /// Quick commands need at least two messages of context.
    pub fn quick_command_prompt(&self, command: QuickCommand) -> Result<&'static str, ChatError> {
        if self.user_messages < 2 {
            return Err(ChatError::NoContext);
        }
        Ok(command.prompt())
    }

    pub fn clear_chat(&mut self) -> TranscriptEntry {
        self.transcript.clear();
        self.user_messages = 0;
        self.session.clear();
        self.current_request = None;
        self.notice(notices::CHAT_CLEARED)
    }

    pub fn clear_memory(&mut self) {
        self.persistent.clear();
        self.session.clear();
        self.current_request = None;
    }

    pub fn remember(&mut self, key: String, value: String) {
        self.persistent.insert(key, value);
    }

    pub fn forget(&mut self, key: &str) -> Option<String> {
        self.persistent.remove(key)
    }

    pub fn apply_setting(&mut self, change: SettingChange) -> &Settings {
        self.settings.apply(change);
        self.session.set_bound(self.settings.max_history);
        &self.settings
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            status: self.status(),
            engine: self.engine_status.clone(),
            settings: self.settings.clone(),
            entries: self.transcript.entries().to_vec(),
            session_turns: self.session.iter().cloned().collect(),
            persistent: self.persistent.clone(),
            user_messages: self.user_messages,
            model_path: self.model_path.clone(),
        }
    }

    /// True while a spawned runtime process is held.
    pub fn owns_runtime(&self) -> bool {
        self.runtime.is_some()
    }
}
