//! Injects blocks into the final prompt string.

use super::schema::{Block, PromptPayload};

pub const USER_LABEL: &str = "User:";
pub const ASSISTANT_LABEL: &str = "Assistant:";

/// Renders the payload line by line, joined with `\n`, ending on the bare
/// assistant label where generation starts.
pub fn inject(payload: &PromptPayload<'_>, user_message: &str) -> String {
    let mut lines: Vec<String> = vec![payload.system.to_string()];

    for block in &payload.blocks {
        lines.push(String::new());
        lines.push(block.title().to_string());
        match block {
            Block::UserInformation(entries) => {
                for (key, value) in entries {
                    lines.push(format!("{}: {}", key, value));
                }
            }
            Block::RecentConversation(turns) => {
                for turn in turns {
                    lines.push(format!("{} {}", USER_LABEL, turn.user()));
                    lines.push(format!("{} {}", ASSISTANT_LABEL, turn.assistant()));
                }
            }
        }
    }

    lines.push(format!("{} {}", USER_LABEL, user_message));
    lines.push(ASSISTANT_LABEL.to_string());
    lines.join("\n")
}
