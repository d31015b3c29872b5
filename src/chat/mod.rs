//! Chat controller: the single owner of conversation state.

pub mod controller;
pub mod generation;
pub mod notices;
pub mod state;

pub use controller::{ChatCommand, ChatController, ChatHandle};
pub use generation::{run_generation, GenerationOutcome};
pub use state::{AppState, ChatSnapshot, ChatStatus, EngineStatus, Indicator, PendingTurn};

use crate::config::Settings;
use crate::transcript::TranscriptEntry;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ChatError {
    #[error("Please wait for the model to finish loading.")]
    NotReady,
    #[error("Please wait for the current response to finish.")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Please have a conversation first.")]
    NoContext,
    #[error("Chat controller has stopped")]
    ControllerStopped,
    #[error("Failed to export: {0}")]
    Export(String),
}

/// Pushed to the UI as state changes.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    EntryAdded { entry: TranscriptEntry },
    StatusChanged {
        status: ChatStatus,
        indicator: Option<Indicator>,
    },
    TranscriptCleared,
    SettingsChanged { settings: Settings },
}
