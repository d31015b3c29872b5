//! Fixed prompt text.

use serde::{Deserialize, Serialize};

pub const SYSTEM_PROMPT: &str = "You are R3KON GPT, a professional cybersecurity assistant. \
CRITICAL RULES:\n\
1. ALWAYS respond in English only. Never use Chinese or any other language.\n\
2. Stay strictly on topic related to cybersecurity, programming, or the user's question.\n\
3. Keep responses clear, concise, and professional.\n\
4. Use structured formatting: bullet points, numbered lists, or paragraphs as appropriate.\n\
5. Never repeat yourself or generate repetitive content.\n\
6. If asked something off-topic, politely redirect to cybersecurity topics.\n";

/// Canned follow-ups about the previous answer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuickCommand {
    Summarize,
    Explain,
}

impl QuickCommand {
    pub fn prompt(self) -> &'static str {
        match self {
            QuickCommand::Summarize => "Summarize your last response in 2-3 bullet points.",
            QuickCommand::Explain => "Explain your last response in simpler terms.",
        }
    }
}
