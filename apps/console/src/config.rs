//! Console configuration
//!
//! Loaded from JSON. Every field is optional; anything missing falls back
//! to its default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use routewatch_session_core::{LoggingConfig, SessionConfig};
use routewatch_session_system::DEFAULT_POLL_INTERVAL;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Application identifier for directory paths
const APP_QUALIFIER: &str = "dev";
const APP_ORGANIZATION: &str = "routewatch";
const APP_NAME: &str = "routewatch";
const CONFIG_FILE: &str = "config.json";

/// Default interval for the desktop route poller
pub const DEFAULT_POLL_INTERVAL_MS: u64 = DEFAULT_POLL_INTERVAL.as_millis() as u64;

// ============================================================================
// Backend selection
// ============================================================================

/// Which session backend to drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    System,
    Webrtc,
    Sdk,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Webrtc => "webrtc",
            Self::Sdk => "sdk",
        }
    }

    /// The session configuration this backend uses when none is given.
    pub fn preset(&self) -> SessionConfig {
        match self {
            Self::System => SessionConfig::system(),
            Self::Webrtc => SessionConfig::webrtc(),
            Self::Sdk => SessionConfig::sdk(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub logging: LoggingConfig,
    pub backend: BackendKind,
    /// Overrides the backend's preset when present
    pub session: Option<SessionConfig>,
    pub poll_interval_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            backend: BackendKind::default(),
            session: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ConsoleConfig {
    /// `<config dir>/config.json` for this user, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn session_config(&self, backend: BackendKind) -> SessionConfig {
        self.session.clone().unwrap_or_else(|| backend.preset())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
