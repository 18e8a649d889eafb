//! Credential sources.
//!
//! Handles:
//! - Locating and reading the TOOLS.md notes file
//! - Access to environment variables behind a small trait so resolution
//!   stays a pure function of its inputs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

/// Notes file, relative to the home directory.
const DEFAULT_CONFIG_PATH: &str = "clawd/TOOLS.md";

/// Default location of the config source.
pub fn default_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(DEFAULT_CONFIG_PATH))
}

/// Contents of the structured text document credentials are pulled from.
///
/// An absent file is an empty source, not an error.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    contents: Option<String>,
}

impl ConfigSource {
    /// Load the config source from disk, or return an empty source.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config source not found");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config source from {:?}", path))?;

        Ok(Self::from_text(contents))
    }

    pub fn from_text(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    /// Raw text, `None` when the source did not exist.
    pub fn text(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

/// Read access to environment variables.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Env for HashMap<&str, &str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| (*value).to_string())
    }
}
