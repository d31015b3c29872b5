use serde::Serialize;
use std::collections::VecDeque;

/// One completed exchange. Immutable once recorded.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    user: String,
    assistant: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn assistant(&self) -> &str {
        &self.assistant
    }
}

/// Most recent turns, oldest first, never longer than `bound`.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    turns: VecDeque<Turn>,
    bound: usize,
}

impl SessionMemory {
    pub fn new(bound: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(bound.min(64)),
            bound,
        }
    }

    /// Appends a turn and evicts from the oldest end; returns the last evicted turn.
    pub fn push(&mut self, turn: Turn) -> Option<Turn> {
        self.turns.push_back(turn);
        self.trim()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Changing the bound trims immediately.
    pub fn set_bound(&mut self, bound: usize) {
        self.bound = bound;
        self.trim();
    }

    /// The last `min(window, len)` turns, oldest first.
    pub fn recent(&self, window: usize) -> impl Iterator<Item = &Turn> {
        let skip = self.turns.len().saturating_sub(window);
        self.turns.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn trim(&mut self) -> Option<Turn> {
        let mut evicted = None;
        while self.turns.len() > self.bound {
            evicted = self.turns.pop_front();
        }
        evicted
    }
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new(10)
    }
}
