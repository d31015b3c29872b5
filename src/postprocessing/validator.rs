//! Language policy check.

use super::traits::{ResponseStage, StageOutcome};
use regex::Regex;
use std::sync::OnceLock;

pub const ENGLISH_ONLY_APOLOGY: &str =
    "I apologize, but I can only respond in English. Let me answer your question in English.";

const CJK_PATTERN: &str = r"[\x{4E00}-\x{9FFF}]";

pub fn contains_cjk(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(CJK_PATTERN).expect("CJK pattern is a valid regex"))
        .is_match(text)
}

/// Replaces any answer containing CJK ideographs with a fixed apology.
#[derive(Debug, Default, Clone, Copy)]
pub struct LanguageGate;

impl ResponseStage for LanguageGate {
    fn name(&self) -> &'static str {
        "language_gate"
    }

    fn apply(&self, text: &str) -> StageOutcome {
        if contains_cjk(text) {
            StageOutcome::Stop(ENGLISH_ONLY_APOLOGY.to_string())
        } else {
            StageOutcome::Continue(text.to_string())
        }
    }
}
