use super::traits::{ResponseStage, StageOutcome};
use crate::config::ResponseLength;

pub const TRIMMED_NOTICE: &str = "...\n\n(Response trimmed. Ask me to elaborate if needed.)";

/// Caps the answer at `limit` characters (Unicode scalar values).
#[derive(Debug, Clone, Copy)]
pub struct LengthCap {
    limit: usize,
}

impl LengthCap {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn for_length(length: ResponseLength) -> Self {
        Self::new(length.char_limit())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl ResponseStage for LengthCap {
    fn name(&self) -> &'static str {
        "length_cap"
    }

    fn apply(&self, text: &str) -> StageOutcome {
        match text.char_indices().nth(self.limit) {
            Some((cut, _)) => {
                let mut trimmed = text[..cut].to_string();
                trimmed.push_str(TRIMMED_NOTICE);
                StageOutcome::Continue(trimmed)
            }
            None => StageOutcome::Continue(text.to_string()),
        }
    }
}
