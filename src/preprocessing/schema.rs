//! Data model for prompt sections.

use crate::memory::Turn;

/// A titled section placed between the system text and the new message.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    UserInformation(Vec<(&'a str, &'a str)>),
    RecentConversation(Vec<&'a Turn>),
}

impl Block<'_> {
    pub fn title(&self) -> &'static str {
        match self {
            Block::UserInformation(_) => "--- User Information ---",
            Block::RecentConversation(_) => "--- Recent Conversation ---",
        }
    }
}

/// Everything the injector needs, borrowed from the owner's state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PromptPayload<'a> {
    pub system: &'a str,
    pub blocks: Vec<Block<'a>>,
}
