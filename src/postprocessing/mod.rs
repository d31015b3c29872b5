//! Final polish of the assistant response before it reaches the user.
//!
//! Stages run in order: language gate, repetition filter, then (standalone
//! filter only) the length cap. The generation path deliberately skips the cap.

pub mod formatter;
pub mod traits;
pub mod trimmer;
pub mod validator;

pub use formatter::{suppress_repetition, RepetitionFilter, DEFAULT_REPEAT_WINDOW};
pub use traits::{ResponseStage, StageOutcome};
pub use trimmer::{LengthCap, TRIMMED_NOTICE};
pub use validator::{contains_cjk, LanguageGate, ENGLISH_ONLY_APOLOGY};

use crate::config::ResponseLength;
use tracing::debug;

pub struct PostProcessor {
    stages: Vec<Box<dyn ResponseStage>>,
}

impl PostProcessor {
    pub fn new(stages: Vec<Box<dyn ResponseStage>>) -> Self {
        Self { stages }
    }

    /// Stages applied to every generated reply.
    pub fn for_generation() -> Self {
        Self::new(vec![
            Box::new(LanguageGate),
            Box::new(RepetitionFilter::default()),
        ])
    }

    pub fn for_filter(length: ResponseLength) -> Self {
        Self::new(vec![
            Box::new(LanguageGate),
            Box::new(RepetitionFilter::default()),
            Box::new(LengthCap::for_length(length)),
        ])
    }

    pub fn process(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for stage in &self.stages {
            match stage.apply(&text) {
                StageOutcome::Continue(next) => text = next,
                StageOutcome::Stop(done) => {
                    debug!(stage = stage.name(), "Post-processing stopped early");
                    return done;
                }
            }
        }
        text
    }
}

impl std::fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("PostProcessor").field("stages", &names).finish()
    }
}

/// Language gate, repetition filter and length cap in one call.
pub fn filter_response(raw: &str, length: ResponseLength) -> String {
    PostProcessor::for_filter(length).process(raw)
}
