//! Conversation memory.
//! Session memory is a bounded window of recent turns; persistent memory is
//! a small ordered key/value profile kept on disk.

pub mod persistent;
pub mod session;

pub use persistent::{MemoryStore, PersistentMemory};
pub use session::{SessionMemory, Turn};

#[cfg(test)]
mod tests;
