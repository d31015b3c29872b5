//! Pluggable post-processing stages.

/// Result of one stage: keep going with new text, or finish with this text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Continue(String),
    Stop(String),
}

pub trait ResponseStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, text: &str) -> StageOutcome;
}
