//! Category-scoped logging on top of `tracing`.
//!
//! Each backend variant logs under its own target so a subscriber filter can
//! enable or silence it independently. [`LoggingConfig::filter_directives`]
//! renders the matching `EnvFilter` string.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SYSTEM_TARGET: &str = "routewatch::system";
pub const WEBRTC_TARGET: &str = "routewatch::webrtc";
pub const SDK_TARGET: &str = "routewatch::sdk";
pub const CONSOLE_TARGET: &str = "routewatch::console";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    System,
    Webrtc,
    Sdk,
    Console,
}

impl LogCategory {
    pub const ALL: [LogCategory; 4] = [Self::System, Self::Webrtc, Self::Sdk, Self::Console];

    pub fn target(&self) -> &'static str {
        match self {
            Self::System => SYSTEM_TARGET,
            Self::Webrtc => WEBRTC_TARGET,
            Self::Sdk => SDK_TARGET,
            Self::Console => CONSOLE_TARGET,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::Webrtc => "webrtc",
            Self::Sdk => "sdk",
            Self::Console => "console",
        };
        write!(f, "{}", name)
    }
}

/// Logger bound to one category.
///
/// `tracing` needs a constant target per call site, hence the dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLogger {
    category: LogCategory,
}

impl SessionLogger {
    pub fn new(category: LogCategory) -> Self {
        Self { category }
    }

    pub fn category(&self) -> LogCategory {
        self.category
    }

    pub fn log(&self, message: impl fmt::Display) {
        match self.category {
            LogCategory::System => tracing::info!(target: SYSTEM_TARGET, "{}", message),
            LogCategory::Webrtc => tracing::info!(target: WEBRTC_TARGET, "{}", message),
            LogCategory::Sdk => tracing::info!(target: SDK_TARGET, "{}", message),
            LogCategory::Console => tracing::info!(target: CONSOLE_TARGET, "{}", message),
        }
    }

    pub fn debug(&self, message: impl fmt::Display) {
        match self.category {
            LogCategory::System => tracing::debug!(target: SYSTEM_TARGET, "{}", message),
            LogCategory::Webrtc => tracing::debug!(target: WEBRTC_TARGET, "{}", message),
            LogCategory::Sdk => tracing::debug!(target: SDK_TARGET, "{}", message),
            LogCategory::Console => tracing::debug!(target: CONSOLE_TARGET, "{}", message),
        }
    }

    pub fn error(&self, message: impl fmt::Display) {
        match self.category {
            LogCategory::System => tracing::error!(target: SYSTEM_TARGET, "{}", message),
            LogCategory::Webrtc => tracing::error!(target: WEBRTC_TARGET, "{}", message),
            LogCategory::Sdk => tracing::error!(target: SDK_TARGET, "{}", message),
            LogCategory::Console => tracing::error!(target: CONSOLE_TARGET, "{}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Process-wide logging switch plus the set of enabled categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub categories: Vec<LogCategory>,
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: LogCategory::ALL.to_vec(),
            level: LogLevel::Info,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directives: everything off, then each enabled category
    /// at the configured level.
    pub fn filter_directives(&self) -> String {
        if !self.enabled || self.categories.is_empty() {
            return "off".to_string();
        }

        let mut directives = vec!["off".to_string()];
        for category in &self.categories {
            directives.push(format!("{}={}", category.target(), self.level.as_str()));
        }
        directives.join(",")
    }

    pub fn is_enabled(&self, category: LogCategory) -> bool {
        self.enabled && self.categories.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_logging_turns_everything_off() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert_eq!(config.filter_directives(), "off");
        assert!(!config.is_enabled(LogCategory::System));
    }

    #[test]
    fn test_directives_per_category() {
        let config = LoggingConfig {
            enabled: true,
            categories: vec![LogCategory::Webrtc, LogCategory::Console],
            level: LogLevel::Debug,
        };
        assert_eq!(
            config.filter_directives(),
            "off,routewatch::webrtc=debug,routewatch::console=debug"
        );
        assert!(config.is_enabled(LogCategory::Webrtc));
        assert!(!config.is_enabled(LogCategory::Sdk));
    }

    #[test]
    fn test_logger_without_subscriber_is_noop() {
        let logger = SessionLogger::new(LogCategory::Sdk);
        logger.log("nothing listening");
        logger.error(format_args!("still fine {}", 1));
        assert_eq!(logger.category(), LogCategory::Sdk);
    }
}
