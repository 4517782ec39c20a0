/// Failures raised while resolving configuration.
///
/// Only [`ConfigError::Configuration`] ever reaches a caller of the public
/// resolution API; [`ConfigError::InvalidEnvironment`] is recovered where it
/// is raised by falling back to the default environment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ConfigError {
    /// Wrap an uncategorized failure so callers only ever see a
    /// configuration failure.
    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        ConfigError::Configuration(format!("Environment management failed: {}", err))
    }
}

/// Failures while binding a handler to the logging sink.
///
/// These never escape [`crate::init::LoggingInitializer::initialize`]; they
/// select the fallback configuration instead.
#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("log sink unavailable: {0}")]
    SinkUnavailable(#[from] std::io::Error),

    #[error("log sink panicked during setup: {0}")]
    Panicked(String),

    #[error("failed to install global subscriber: {0}")]
    GlobalInstall(String),
}
