use crate::environment::{Environment, EnvironmentResolver};
use crate::error::LoggingError;
use crate::layer::{Handler, LoggingSink};
use crate::logger::ContextLogger;
use crate::policy::{LogFormat, LogLevel, LogPolicy};
use crate::sink::{LogSink, StderrSink};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

/// Live handle returned by a successful initialization.
#[derive(Debug, Clone)]
pub struct LogController {
    service_name: String,
    environment: Environment,
    policy: LogPolicy,
}

impl LogController {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn level(&self) -> LogLevel {
        self.policy.level
    }

    pub fn format(&self) -> LogFormat {
        self.policy.format
    }

    /// Logger named `name` that tags each event with this controller's
    /// service name and environment.
    pub fn logger(&self, name: impl Into<String>) -> ContextLogger {
        ContextLogger::new(name, self.service_name.clone(), self.environment)
    }
}

/// Outcome of [`LoggingInitializer::initialize`].
///
/// `Noop` means the fallback configuration is active: context loggers
/// are unavailable but logging itself still works.
#[derive(Debug, Clone)]
pub enum LoggingHandle {
    Live(LogController),
    Noop,
}

impl LoggingHandle {
    pub fn is_live(&self) -> bool {
        matches!(self, LoggingHandle::Live(_))
    }

    pub fn controller(&self) -> Option<&LogController> {
        match self {
            LoggingHandle::Live(controller) => Some(controller),
            LoggingHandle::Noop => None,
        }
    }

    /// Context logger, or `None` when running on the fallback.
    pub fn logger(&self, name: impl Into<String>) -> Option<ContextLogger> {
        self.controller().map(|c| c.logger(name))
    }
}

/// Applies the environment's [`LogPolicy`] to a [`LoggingSink`].
///
/// **Behavior**
///
/// Resolves the environment, binds exactly one handler (replacing any
/// previous one) and logs the effective level. Any failure along the way
/// installs the fallback configuration instead, logs the failure, and
/// yields [`LoggingHandle::Noop`]; nothing is propagated to the caller.
#[derive(Debug, Clone)]
pub struct LoggingInitializer {
    resolver: EnvironmentResolver,
    sink: LoggingSink,
    writer: Arc<dyn LogSink>,
}

impl Default for LoggingInitializer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingInitializer {
    /// Process environment, the global sink, and stderr output.
    pub fn new() -> Self {
        LoggingInitializer {
            resolver: EnvironmentResolver::new(),
            sink: LoggingSink::global(),
            writer: Arc::new(StderrSink),
        }
    }

    pub fn with_resolver(mut self, resolver: EnvironmentResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_sink(mut self, sink: LoggingSink) -> Self {
        self.sink = sink;
        self
    }

    /// Destination for the handler's rendered lines.
    pub fn with_writer(mut self, writer: Arc<dyn LogSink>) -> Self {
        self.writer = writer;
        self
    }

    pub fn sink(&self) -> &LoggingSink {
        &self.sink
    }

    /// Configure logging for `service_name`. Never fails.
    ///
    /// A writer that panics while being set up is treated like one that
    /// refused: the panic is contained and the fallback is installed.
    pub fn initialize(&self, service_name: &str) -> LoggingHandle {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_initialize(service_name)))
            .unwrap_or_else(|payload| Err(LoggingError::Panicked(panic_message(payload))));

        match outcome {
            Ok(controller) => LoggingHandle::Live(controller),
            Err(err) => {
                self.sink.install_fallback();
                error!("Failed to setup advanced logging: {}", err);
                info!("Using fallback logging configuration");
                LoggingHandle::Noop
            }
        }
    }

    fn try_initialize(&self, service_name: &str) -> Result<LogController, LoggingError> {
        // Attach before resolving so the resolver's diagnostics are held
        // and replayed once the handler is bound.
        self.sink.attach()?;
        let environment = self.resolver.resolve();
        let policy = LogPolicy::for_environment(environment);

        self.sink.configure(Handler::new(
            policy,
            service_name,
            environment,
            Arc::clone(&self.writer),
        ))?;

        info!(
            "Log level set to {} for environment {}",
            policy.level, environment
        );

        Ok(LogController {
            service_name: service_name.to_string(),
            environment,
            policy,
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Initialize process-wide logging for `service_name` with defaults.
///
/// Equivalent to `LoggingInitializer::new().initialize(service_name)`.
pub fn init_logging(service_name: &str) -> LoggingHandle {
    LoggingInitializer::new().initialize(service_name)
}
