//! Context builder: turns memory and the new message into the prompt text.
//!
//! ```text
//! <system instruction>
//!
//! --- User Information ---        (persistent memory, when enabled)
//! key: value
//!
//! --- Recent Conversation ---     (session memory window, when enabled)
//! User: ...
//! Assistant: ...
//! User: <message>
//! Assistant:
//! ```

pub mod cleaner;
pub mod formatter;
pub mod injector;
pub mod schema;
pub mod templates;

pub use cleaner::{Cleaner, CleanerError};
pub use formatter::format_context;
pub use injector::inject;
pub use schema::{Block, PromptPayload};
pub use templates::{QuickCommand, SYSTEM_PROMPT};

use crate::config::Settings;
use crate::memory::{PersistentMemory, SessionMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub persistent_memory: bool,
    pub session_memory: bool,
    /// Window of most recent turns replayed; independent of the stored bound.
    pub recent_turns: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for PromptOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            persistent_memory: settings.persistent_memory,
            session_memory: settings.session_memory,
            recent_turns: settings.context_turns,
        }
    }
}

/// Builds the full prompt. Pure; nothing is mutated.
pub fn build_prompt(
    system_prompt: &str,
    persistent: &PersistentMemory,
    session: &SessionMemory,
    user_message: &str,
    options: &PromptOptions,
) -> String {
    let payload = format_context(system_prompt, persistent, session, options);
    inject(&payload, user_message)
}

#[cfg(test)]
mod tests;
