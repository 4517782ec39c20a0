//! Environment-qualified naming for stacks and provisioned resources.
//!
//! Production keeps canonical names so existing infrastructure, exports
//! and DNS stay addressable; every other environment gets a `-<env>`
//! suffix so several environments can share one account.

use crate::env::{env_or, DEFAULT_REGION, REGION_ENV};
use crate::environment::{Environment, EnvironmentResolver};

/// Derives names, suffixes and the region for one service.
///
/// The environment is resolved once at construction.
#[derive(Debug, Clone)]
pub struct ConfigurationProvider {
    service_name: String,
    environment: Environment,
    resolver: EnvironmentResolver,
}

impl ConfigurationProvider {
    /// Provider for `service_name` backed by the process environment.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_resolver(service_name, EnvironmentResolver::new())
    }

    pub fn with_resolver(service_name: impl Into<String>, resolver: EnvironmentResolver) -> Self {
        let environment = resolver.resolve();
        Self {
            service_name: service_name.into(),
            environment,
            resolver,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// `base_name` unchanged in production, `base_name-<env>` otherwise.
    ///
    /// ```
    /// use env_log_policy::env::{vars, ENVIRONMENT_ENV};
    /// use env_log_policy::environment::EnvironmentResolver;
    /// use env_log_policy::naming::ConfigurationProvider;
    ///
    /// let resolver = EnvironmentResolver::with_source(vars([(ENVIRONMENT_ENV, "staging")]));
    /// let provider = ConfigurationProvider::with_resolver("core", resolver);
    /// assert_eq!(provider.stack_name("Core-Stack"), "Core-Stack-staging");
    /// ```
    pub fn stack_name(&self, base_name: &str) -> String {
        format!("{}{}", base_name, self.environment_suffix())
    }

    /// Value of [`REGION_ENV`], or [`DEFAULT_REGION`] when unset.
    pub fn region(&self) -> String {
        env_or(self.resolver.source(), REGION_ENV, DEFAULT_REGION)
    }

    /// Empty in production, `-<env>` otherwise.
    pub fn environment_suffix(&self) -> String {
        if self.environment.is_production() {
            String::new()
        } else {
            format!("-{}", self.environment)
        }
    }
}
