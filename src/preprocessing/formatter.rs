//! Converts memory into structured prompt blocks.

use super::schema::{Block, PromptPayload};
use super::PromptOptions;
use crate::memory::{PersistentMemory, SessionMemory};

pub fn format_context<'a>(
    system: &'a str,
    persistent: &'a PersistentMemory,
    session: &'a SessionMemory,
    options: &PromptOptions,
) -> PromptPayload<'a> {
    let mut payload = PromptPayload {
        system,
        blocks: Vec::new(),
    };

    if options.persistent_memory && !persistent.is_empty() {
        payload
            .blocks
            .push(Block::UserInformation(persistent.iter().collect()));
    }

    if options.session_memory && !session.is_empty() {
        let turns: Vec<_> = session.recent(options.recent_turns).collect();
        // A zero window leaves nothing to show; skip the header too.
        if !turns.is_empty() {
            payload.blocks.push(Block::RecentConversation(turns));
        }
    }

    payload
}
