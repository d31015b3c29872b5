//! Cleans repeated lines out of the raw response.

use super::traits::{ResponseStage, StageOutcome};

pub const DEFAULT_REPEAT_WINDOW: usize = 2;

/// Drops blank lines, and any line equal to one of the last `window` lines kept.
pub fn suppress_repetition(text: &str, window: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let recent = &kept[kept.len().saturating_sub(window)..];
        if !recent.contains(&line) {
            kept.push(line);
        }
    }
    kept.join("\n")
}

#[derive(Debug, Clone, Copy)]
pub struct RepetitionFilter {
    window: usize,
}

impl RepetitionFilter {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Default for RepetitionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_WINDOW)
    }
}

impl ResponseStage for RepetitionFilter {
    fn name(&self) -> &'static str {
        "repetition_filter"
    }

    fn apply(&self, text: &str) -> StageOutcome {
        StageOutcome::Continue(suppress_repetition(text, self.window))
    }
}
