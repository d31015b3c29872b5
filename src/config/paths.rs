//! File locations used by the assistant.
//!
//! ```text
//! ~/rekon_config.json     # settings record
//! ~/rekon_memory.json     # persistent memory
//! ~/rekon_engine.toml     # optional engine settings
//! ~/.rekon/logs/          # rolling log files
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    home: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self, PathError> {
        dirs::home_dir()
            .map(Self::at)
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Roots every path at `home`; used by tests and portable installs.
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn settings_file(&self) -> PathBuf {
        self.home.join("rekon_config.json")
    }

    pub fn memory_file(&self) -> PathBuf {
        self.home.join("rekon_memory.json")
    }

    pub fn engine_file(&self) -> PathBuf {
        self.home.join("rekon_engine.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.home.join(".rekon").join("logs")
    }

    /// Chat exports land in the working directory, or the home directory if it is unknown.
    pub fn export_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| self.home.clone())
    }
}
