pub mod env;
pub mod error;
pub mod environment;
pub mod naming;
pub mod policy;
pub mod record;
pub mod sink;
pub mod layer;
pub mod logger;
pub mod init;
pub mod config;

#[cfg(test)]
mod testing;

pub use config::ResolvedConfiguration;
pub use environment::{Environment, EnvironmentResolver};
pub use error::{ConfigError, LoggingError};
pub use init::{init_logging, LogController, LoggingHandle, LoggingInitializer};
pub use naming::ConfigurationProvider;
pub use policy::{LogFormat, LogLevel, LogPolicy};
