use serde::Serialize;

use crate::environment::{Environment, EnvironmentResolver};
use crate::error::ConfigError;
use crate::naming::ConfigurationProvider;
use crate::policy::{LogLevel, LogPolicy};

/// Resolved settings for one service, computed once and not mutated.
///
/// `resource_suffix` is empty exactly when `environment` is production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfiguration {
    pub environment: Environment,
    pub service_name: String,
    pub region: String,
    pub log_level: LogLevel,
    pub resource_suffix: String,
}

impl ResolvedConfiguration {
    /// Snapshot for `service_name` from the process environment.
    pub fn create_for_service(service_name: &str) -> Self {
        Self::create_with(service_name, &EnvironmentResolver::new())
    }

    /// Snapshot for `service_name` resolved through `resolver`.
    pub fn create_with(service_name: &str, resolver: &EnvironmentResolver) -> Self {
        let provider = ConfigurationProvider::with_resolver(service_name, resolver.clone());
        let environment = provider.environment();

        ResolvedConfiguration {
            environment,
            service_name: service_name.to_string(),
            region: provider.region(),
            log_level: LogPolicy::level_for(environment),
            resource_suffix: provider.environment_suffix(),
        }
    }

    /// `base_name` qualified with this snapshot's suffix.
    pub fn stack_name(&self, base_name: &str) -> String {
        format!("{}{}", base_name, self.resource_suffix)
    }

    /// Reject snapshots that cannot name resources.
    ///
    /// This is the one failure that is meant to reach the caller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Configuration(
                "service name must not be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Configuration(
                "region must not be empty".to_string(),
            ));
        }
        if self.resource_suffix.is_empty() != self.environment.is_production() {
            return Err(ConfigError::Configuration(format!(
                "resource suffix {:?} does not match environment {}",
                self.resource_suffix, self.environment
            )));
        }
        Ok(())
    }
}
