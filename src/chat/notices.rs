//! User-visible system texts.

use std::fmt::Display;

pub const LOADING_MODEL: &str = "⏳ Loading R3KON GPT model...";
pub const MODEL_LOADED: &str = "✅ Model loaded successfully! Ask me anything about cybersecurity.";
pub const MODEL_NOT_LOADED: &str = "❌ Model not loaded. Please restart the application.";
pub const TOOK_TOO_LONG: &str =
    "⚠️ Response took too long. Try 'short' or 'medium' response length in settings.";
pub const CHAT_CLEARED: &str = "Chat cleared.";
pub const THINKING: &str = "⏳ R3KON GPT is thinking...";

pub fn load_failed(error: impl Display) -> String {
    format!("❌ Error loading model: {}", error)
}

pub fn timed_out(secs: u64) -> String {
    format!("⚠️ Timed out after {}s. Try shorter response length in settings.", secs)
}

pub fn engine_error(error: impl Display) -> String {
    format!("⚠️ Error: {}", error)
}
