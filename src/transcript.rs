//! The visible chat log and its plain-text export.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const EXPORT_HEADER: &str = "R3KON GPT Chat Export";
const MAX_EXPORT_SUFFIX: u32 = 1000;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write chat export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No free export file name for {stem} in {dir}")]
    NoFreeName { dir: PathBuf, stem: String },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemTag {
    Notice,
    Error,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", content = "tag", rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
    System(SystemTag),
}

/// Display style for a transcript tag.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagStyle {
    pub color: &'static str,
    pub bold: bool,
    pub italic: bool,
}

impl TagStyle {
    pub const USER: TagStyle = TagStyle { color: "#00A3FF", bold: true, italic: false };
    pub const ASSISTANT: TagStyle = TagStyle { color: "#00FF88", bold: true, italic: false };
    pub const NOTICE: TagStyle = TagStyle { color: "#FFB800", bold: false, italic: true };
    pub const ERROR: TagStyle = TagStyle { color: "#FF4444", bold: false, italic: false };
    /// Used by the shell for the transient "thinking" line.
    pub const THINKING: TagStyle = TagStyle { color: "#888888", bold: false, italic: true };
}

impl Speaker {
    pub fn style(self) -> TagStyle {
        match self {
            Speaker::User => TagStyle::USER,
            Speaker::Assistant => TagStyle::ASSISTANT,
            Speaker::System(SystemTag::Notice) => TagStyle::NOTICE,
            Speaker::System(SystemTag::Error) => TagStyle::ERROR,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self::at(speaker, text, Local::now())
    }

    pub fn at(speaker: Speaker, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp,
        }
    }

    pub fn render(&self) -> String {
        let time = self.timestamp.format("%H:%M");
        match self.speaker {
            Speaker::User => format!("\nYou [{}]:\n{}\n", time, self.text),
            Speaker::Assistant => format!("\nR3KON GPT [{}]:\n{}\n", time, self.text),
            Speaker::System(SystemTag::Error) => format!("\nError:\n{}\n", self.text),
            Speaker::System(SystemTag::Notice) => format!("{}\n", self.text),
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) -> &TranscriptEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
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

    pub fn render(&self) -> String {
        self.entries.iter().map(TranscriptEntry::render).collect()
    }

    pub fn export_document(&self, now: DateTime<Local>) -> String {
        format!(
            "{}\nDate: {}\n{}\n\n{}",
            EXPORT_HEADER,
            now.format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(80),
            self.render()
        )
    }

    /// Writes `rekon_chat_<stamp>.txt` into `dir`, adding `_2`, `_3`, ... when
    /// the name is taken. Never overwrites an existing file.
    pub fn export(&self, dir: &Path, now: DateTime<Local>) -> Result<PathBuf, ExportError> {
        let stem = format!("rekon_chat_{}", now.format("%Y%m%d_%H%M%S"));
        let content = self.export_document(now);

        for n in 1..=MAX_EXPORT_SUFFIX {
            let name = if n == 1 {
                format!("{}.txt", stem)
            } else {
                format!("{}_{}.txt", stem, n)
            };
            let path = dir.join(name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(ExportError::Io { path, source }),
            };

            file.write_all(content.as_bytes())
                .map_err(|source| ExportError::Io { path: path.clone(), source })?;
            info!(path = %path.display(), entries = self.len(), "Chat exported");
            return Ok(path);
        }

        Err(ExportError::NoFreeName {
            dir: dir.to_path_buf(),
            stem,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, h, m, 5).unwrap()
    }

    #[test]
    fn entries_render_per_speaker() {
        let user = TranscriptEntry::at(Speaker::User, "What is CSRF?", at(9, 7));
        assert_eq!(user.render(), "\nYou [09:07]:\nWhat is CSRF?\n");

        let bot = TranscriptEntry::at(Speaker::Assistant, "A forged request.", at(14, 30));
        assert_eq!(bot.render(), "\nR3KON GPT [14:30]:\nA forged request.\n");

        let error = TranscriptEntry::at(Speaker::System(SystemTag::Error), "boom", at(1, 1));
        assert_eq!(error.render(), "\nError:\nboom\n");

        let notice = TranscriptEntry::at(Speaker::System(SystemTag::Notice), "Chat cleared.", at(1, 1));
        assert_eq!(notice.render(), "Chat cleared.\n");
    }

    #[test]
    fn styles_follow_speaker() {
        assert_eq!(Speaker::User.style().color, "#00A3FF");
        assert!(Speaker::Assistant.style().bold);
        assert!(Speaker::System(SystemTag::Notice).style().italic);
        assert_eq!(Speaker::System(SystemTag::Error).style().color, "#FF4444");
    }

    #[test]
    fn export_document_layout() {
        let mut transcript = Transcript::new();
        transcript.push(TranscriptEntry::at(Speaker::User, "hi", at(10, 0)));

        let doc = transcript.export_document(at(10, 1));
        let expected = format!(
            "R3KON GPT Chat Export\nDate: 2024-03-09 10:01:05\n{}\n\n\nYou [10:00]:\nhi\n",
            "=".repeat(80)
        );
        assert_eq!(doc, expected);
    }

    #[test]
    fn identical_transcripts_render_identically() {
        let build = || {
            let mut t = Transcript::new();
            t.push(TranscriptEntry::at(Speaker::User, "q", at(8, 0)));
            t.push(TranscriptEntry::at(Speaker::Assistant, "a", at(8, 1)));
            t
        };
        assert_eq!(build().export_document(at(9, 0)), build().export_document(at(9, 0)));
    }

    #[test]
    fn repeated_exports_never_overwrite() {
        let dir = tempdir().unwrap();
        let transcript = Transcript::new();
        let now = at(12, 0);

        let first = transcript.export(dir.path(), now).unwrap();
        let second = transcript.export(dir.path(), now).unwrap();
        let third = transcript.export(dir.path(), now).unwrap();

        assert_eq!(first.file_name().unwrap(), "rekon_chat_20240309_120005.txt");
        assert_eq!(second.file_name().unwrap(), "rekon_chat_20240309_120005_2.txt");
        assert_eq!(third.file_name().unwrap(), "rekon_chat_20240309_120005_3.txt");
        assert!(std::fs::read_to_string(first).unwrap().starts_with(EXPORT_HEADER));
    }

    #[test]
    fn export_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let err = Transcript::new()
            .export(&dir.path().join("absent"), at(12, 0))
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
