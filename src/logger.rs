use std::fmt;

use tracing::Level;

use crate::environment::Environment;

/// Named logger that tags every event with a service name and
/// environment, plus optional correlation attributes.
///
/// Obtained from [`crate::init::LogController::logger`]; only available
/// when logging was initialized successfully.
#[derive(Debug, Clone)]
pub struct ContextLogger {
    name: String,
    service: String,
    environment: Environment,
    user_id: Option<String>,
    request_id: Option<String>,
    exception: Option<String>,
}

macro_rules! emit {
    ($level:expr, $logger:expr, $message:expr) => {
        tracing::event!(
            $level,
            logger = $logger.name.as_str(),
            service = $logger.service.as_str(),
            environment = $logger.environment.as_str(),
            user_id = $logger.user_id.as_deref(),
            request_id = $logger.request_id.as_deref(),
            exception = $logger.exception.as_deref(),
            "{}",
            $message
        )
    };
}

impl ContextLogger {
    pub(crate) fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        environment: Environment,
    ) -> Self {
        ContextLogger {
            name: name.into(),
            service: service.into(),
            environment,
            user_id: None,
            request_id: None,
            exception: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach an error description (with its source chain) to every
    /// event emitted through the returned logger.
    pub fn with_exception(mut self, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(&format!("\nCaused by: {}", cause));
            source = cause.source();
        }
        self.exception = Some(text);
        self
    }

    pub fn debug(&self, message: impl fmt::Display) {
        emit!(Level::DEBUG, self, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        emit!(Level::INFO, self, message);
    }

    pub fn warning(&self, message: impl fmt::Display) {
        emit!(Level::WARN, self, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        emit!(Level::ERROR, self, message);
    }
}
