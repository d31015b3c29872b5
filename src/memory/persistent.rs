use crate::storage::{self, JsonDocument};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Ordered string-to-string profile. Iteration follows insertion order.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(into = "Map<String, Value>")]
pub struct PersistentMemory {
    entries: Vec<(String, String)>,
}

impl PersistentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value in place when the key exists, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Fails on the first non-string value; the caller decides what that means.
    pub fn from_document(document: Map<String, Value>) -> Option<Self> {
        document
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect()
    }

    pub fn to_document(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PersistentMemory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut memory = PersistentMemory::new();
        for (key, value) in iter {
            memory.insert(key, value);
        }
        memory
    }
}

impl From<PersistentMemory> for Map<String, Value> {
    fn from(memory: PersistentMemory) -> Self {
        memory.to_document()
    }
}

/// File-backed persistent memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    document: JsonDocument,
}

impl MemoryStore {
    pub fn new(document: JsonDocument) -> Self {
        Self { document }
    }

    /// Missing or malformed documents load as an empty profile.
    pub fn load(&self) -> PersistentMemory {
        let document = match self.document.read_object() {
            Ok(Some(document)) => document,
            Ok(None) => return PersistentMemory::new(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable memory file");
                return PersistentMemory::new();
            }
        };

        match PersistentMemory::from_document(document) {
            Some(memory) => {
                info!(entries = memory.len(), "Loaded persistent memory");
                memory
            }
            None => {
                warn!(
                    path = %self.document.path().display(),
                    "Memory file holds non-string values, starting empty"
                );
                PersistentMemory::new()
            }
        }
    }

    pub fn save(&self, memory: &PersistentMemory) -> storage::Result<()> {
        self.document.write(&memory.to_document())
    }
}
