//! Environment to log verbosity and record format.

use std::fmt;

use serde::Serialize;
use tracing::Level;

use crate::environment::Environment;

/// Policy verbosity threshold. Ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
        }
    }

    /// Least severe `tracing` level that passes this threshold.
    pub fn as_tracing(&self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
        }
    }

    /// Whether an event at `level` passes this threshold.
    pub fn allows(&self, level: &Level) -> bool {
        *level <= self.as_tracing()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-case level name used in rendered records.
///
/// `TRACE` folds into `DEBUG` since the policy has no finer level.
pub fn level_name(level: &Level) -> &'static str {
    if *level == Level::ERROR {
        "ERROR"
    } else if *level == Level::WARN {
        "WARNING"
    } else if *level == Level::INFO {
        "INFO"
    } else {
        "DEBUG"
    }
}

/// How a record is rendered into a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `timestamp - logger - level - [service:environment] - message`
    Human,
    /// One JSON object per line.
    Structured,
    /// `timestamp - logger - level - message`, used only by the fallback.
    Plain,
}

/// Fixed mapping from environment to level and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPolicy {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LogPolicy {
    /// Level for names outside the known environments.
    pub const DEFAULT_LEVEL: LogLevel = LogLevel::Info;

    pub fn for_environment(env: Environment) -> Self {
        LogPolicy {
            level: Self::level_for(env),
            format: Self::format_for(env),
        }
    }

    pub fn level_for(env: Environment) -> LogLevel {
        match env {
            Environment::Development => LogLevel::Debug,
            Environment::Staging => LogLevel::Info,
            Environment::Production => LogLevel::Warning,
        }
    }

    /// Level lookup by raw environment name, [`Self::DEFAULT_LEVEL`] when
    /// the name is not a known environment.
    pub fn level_for_name(name: &str) -> LogLevel {
        name.parse::<Environment>()
            .map(Self::level_for)
            .unwrap_or(Self::DEFAULT_LEVEL)
    }

    pub fn format_for(env: Environment) -> LogFormat {
        match env {
            Environment::Development => LogFormat::Human,
            Environment::Staging | Environment::Production => LogFormat::Structured,
        }
    }

    /// Configuration used when full initialization fails.
    pub fn fallback() -> Self {
        LogPolicy {
            level: LogLevel::Info,
            format: LogFormat::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_is_fixed() {
        assert_eq!(LogPolicy::level_for(Environment::Development), LogLevel::Debug);
        assert_eq!(LogPolicy::level_for(Environment::Staging), LogLevel::Info);
        assert_eq!(LogPolicy::level_for(Environment::Production), LogLevel::Warning);
    }

    #[test]
    fn unknown_names_default_to_info() {
        assert_eq!(LogPolicy::level_for_name("qa"), LogLevel::Info);
        assert_eq!(LogPolicy::level_for_name("production"), LogLevel::Warning);
    }

    #[test]
    fn only_development_is_human_readable() {
        assert_eq!(
            LogPolicy::for_environment(Environment::Development).format,
            LogFormat::Human
        );
        assert_eq!(
            LogPolicy::for_environment(Environment::Staging).format,
            LogFormat::Structured
        );
        assert_eq!(
            LogPolicy::for_environment(Environment::Production).format,
            LogFormat::Structured
        );
    }

    #[test]
    fn levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
    }

    #[test]
    fn thresholds_filter_tracing_levels() {
        assert!(LogLevel::Warning.allows(&Level::ERROR));
        assert!(LogLevel::Warning.allows(&Level::WARN));
        assert!(!LogLevel::Warning.allows(&Level::INFO));
        assert!(LogLevel::Debug.allows(&Level::DEBUG));
        assert!(!LogLevel::Debug.allows(&Level::TRACE));
    }

    #[test]
    fn level_names_match_rendered_form() {
        assert_eq!(level_name(&Level::WARN), "WARNING");
        assert_eq!(level_name(&Level::TRACE), "DEBUG");
        assert_eq!(LogLevel::Warning.to_string(), "WARNING");
    }

    #[test]
    fn fallback_is_plain_info() {
        let policy = LogPolicy::fallback();
        assert_eq!(policy.level, LogLevel::Info);
        assert_eq!(policy.format, LogFormat::Plain);
    }
}
