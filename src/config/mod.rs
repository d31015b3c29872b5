//! User-facing settings, engine settings and where they live on disk.

pub mod engine;
pub mod paths;

pub use engine::EngineSettings;
pub use paths::{AppPaths, PathError};

use crate::storage::{self, JsonDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 18;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Colors applied by the shell for a theme.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
    pub input_background: &'static str,
    pub sidebar_background: &'static str,
    pub button_background: &'static str,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: "#1E1E1E",
                foreground: "#FFFFFF",
                input_background: "#2D2D2D",
                sidebar_background: "#252526",
                button_background: "#0E639C",
            },
            Theme::Light => Palette {
                background: "#FFFFFF",
                foreground: "#000000",
                input_background: "#F5F5F5",
                sidebar_background: "#E5E5E5",
                button_background: "#0078D4",
            },
        }
    }
}

/// Requested answer length. Drives both the token budget and the character cap.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    Short,
    #[default]
    Medium,
    Long,
    /// Any value a settings file carries that we do not know; limits fall back to medium.
    #[serde(other)]
    Unrecognized,
}

impl ResponseLength {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => ResponseLength::Short,
            "medium" => ResponseLength::Medium,
            "long" => ResponseLength::Long,
            _ => ResponseLength::Unrecognized,
        }
    }

    /// Character cap used by the standalone response filter.
    pub fn char_limit(self) -> usize {
        match self {
            ResponseLength::Short => 500,
            ResponseLength::Medium => 1000,
            ResponseLength::Long => 2000,
            ResponseLength::Unrecognized => 1000,
        }
    }

    /// `max_tokens` handed to the inference engine.
    pub fn token_budget(self) -> u32 {
        match self {
            ResponseLength::Short => 300,
            ResponseLength::Medium => 600,
            ResponseLength::Long => 1000,
            ResponseLength::Unrecognized => 600,
        }
    }
}

/// The persisted settings record.
///
/// Keys this version does not know about are kept in `extra` and written
/// back untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub font_size: u32,
    pub font_family: String,
    pub response_length: ResponseLength,
    pub session_memory: bool,
    pub persistent_memory: bool,
    /// Number of turns kept in session memory.
    pub max_history: usize,
    /// Number of most recent turns replayed into each prompt.
    pub context_turns: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            font_size: 11,
            font_family: "Segoe UI".to_string(),
            response_length: ResponseLength::Medium,
            session_memory: true,
            persistent_memory: false,
            max_history: 10,
            context_turns: 5,
            extra: Map::new(),
        }
    }
}

/// One settings action from the UI.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum SettingChange {
    Theme(Theme),
    AdjustFont(i32),
    FontFamily(String),
    ResponseLength(ResponseLength),
    SessionMemory(bool),
    PersistentMemory(bool),
    MaxHistory(usize),
    ContextTurns(usize),
}

impl Settings {
    /// Builds settings from a loaded document, merged key by key over the
    /// defaults. A key whose value has the wrong type is dropped on its own;
    /// every other key, known or not, is kept.
    pub fn from_document(document: Map<String, Value>) -> Self {
        let mut merged = match serde_json::to_value(Settings::default()) {
            Ok(Value::Object(defaults)) => defaults,
            _ => Map::new(),
        };

        for (key, value) in document {
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            match serde_json::from_value::<Settings>(Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(e) => warn!(key = %key, error = %e, "Ignoring invalid setting"),
            }
        }

        let mut settings: Settings =
            serde_json::from_value(Value::Object(merged)).unwrap_or_default();
        settings.font_size = settings.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        settings
    }

    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::Theme(theme) => self.theme = theme,
            SettingChange::AdjustFont(delta) => {
                let size = i64::from(self.font_size) + i64::from(delta);
                self.font_size = size.clamp(i64::from(MIN_FONT_SIZE), i64::from(MAX_FONT_SIZE)) as u32;
            }
            SettingChange::FontFamily(family) => self.font_family = family,
            SettingChange::ResponseLength(length) => self.response_length = length,
            SettingChange::SessionMemory(enabled) => self.session_memory = enabled,
            SettingChange::PersistentMemory(enabled) => self.persistent_memory = enabled,
            SettingChange::MaxHistory(turns) => self.max_history = turns,
            SettingChange::ContextTurns(turns) => self.context_turns = turns,
        }
    }
}

/// Reads and writes the settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    document: JsonDocument,
}

impl SettingsStore {
    pub fn new(document: JsonDocument) -> Self {
        Self { document }
    }

    /// Never fails: unreadable or malformed documents fall back to defaults.
    pub fn load(&self) -> Settings {
        match self.document.read_object() {
            Ok(Some(document)) => Settings::from_document(document),
            Ok(None) => {
                debug!(path = %self.document.path().display(), "No settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> storage::Result<()> {
        self.document.write(settings)
    }

    /// Saves and swallows failures; a settings write must never interrupt the chat.
    pub fn persist(&self, settings: &Settings) {
        if let Err(e) = self.save(settings) {
            warn!(error = %e, "Failed to persist settings");
        }
    }
}
