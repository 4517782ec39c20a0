//! Detection and validation of the active named environment.
//!
//! The environment is read from [`ENVIRONMENT_ENV`] on every query. An
//! unset variable selects [`Environment::DEFAULT`]; an unrecognized value
//! is reported at error level and also resolves to the default, so
//! resolution itself never fails.

use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::env::{ProcessEnv, VarSource, ENVIRONMENT_ENV};
use crate::error::ConfigError;

/// One of the fixed set of deployment environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Environment used when the selector is unset or invalid.
    pub const DEFAULT: Environment = Environment::Development;

    /// Every valid environment, in canonical order.
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    /// Canonical spelling, as accepted in [`ENVIRONMENT_ENV`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_staging(&self) -> bool {
        matches!(self, Environment::Staging)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    /// Exact, case-sensitive match against the canonical spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidEnvironment(s.to_string()))
    }
}

/// Resolves the active [`Environment`] from a [`VarSource`].
///
/// Cheap to clone. Nothing is cached: each call re-reads the selector,
/// so two calls may observe different values if the variable changes
/// in between.
#[derive(Clone)]
pub struct EnvironmentResolver {
    source: Arc<dyn VarSource>,
}

impl Default for EnvironmentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvironmentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentResolver").finish_non_exhaustive()
    }
}

impl EnvironmentResolver {
    /// Resolver backed by the process environment.
    pub fn new() -> Self {
        Self::with_source(ProcessEnv)
    }

    pub fn with_source(source: impl VarSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Underlying variable source, shared with components that read
    /// further variables (the region selector).
    pub fn source(&self) -> &dyn VarSource {
        &*self.source
    }

    /// Whether `value` is one of the canonical environment spellings.
    pub fn validate(value: &str) -> bool {
        value.parse::<Environment>().is_ok()
    }

    /// Read the selector without recovering from an invalid value.
    ///
    /// An unset selector yields [`Environment::DEFAULT`].
    pub fn resolve_strict(&self) -> Result<Environment, ConfigError> {
        let env = match self.source.var(ENVIRONMENT_ENV) {
            Some(raw) => raw.parse::<Environment>()?,
            None => Environment::DEFAULT,
        };
        info!("Environment detected: {}", env);
        Ok(env)
    }

    /// Resolve the active environment, degrading to the default on any
    /// invalid selector value.
    pub fn resolve(&self) -> Environment {
        match guard_environment(|| self.resolve_strict().map_err(Into::into)) {
            Ok(env) => env,
            Err(err) => {
                error!("{}, defaulting to {}", err, Environment::DEFAULT);
                Environment::DEFAULT
            }
        }
    }

    pub fn is_production(&self) -> bool {
        self.resolve().is_production()
    }

    pub fn is_development(&self) -> bool {
        self.resolve().is_development()
    }

    pub fn is_staging(&self) -> bool {
        self.resolve().is_staging()
    }
}

/// Apply the environment error policy to a fallible resolution.
///
/// - [`ConfigError::InvalidEnvironment`] recovers to [`Environment::DEFAULT`]
///   after an error-level diagnostic.
/// - [`ConfigError::Configuration`] is returned unchanged.
/// - Any other error is wrapped with [`ConfigError::unexpected`].
pub fn guard_environment<F>(f: F) -> Result<Environment, ConfigError>
where
    F: FnOnce() -> Result<Environment, Box<dyn Error + Send + Sync>>,
{
    let err = match f() {
        Ok(env) => return Ok(env),
        Err(err) => err,
    };

    match err.downcast::<ConfigError>() {
        Ok(config_err) => match *config_err {
            err @ ConfigError::InvalidEnvironment(_) => {
                error!("{}, defaulting to {}", err, Environment::DEFAULT);
                Ok(Environment::DEFAULT)
            }
            err @ ConfigError::Configuration(_) => {
                error!("{}", err);
                Err(err)
            }
        },
        Err(other) => {
            error!("Unexpected error in environment management: {}", other);
            Err(ConfigError::unexpected(other))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::vars;
    use crate::testing::capture;

    fn resolver_for(value: Option<&str>) -> EnvironmentResolver {
        match value {
            Some(v) => EnvironmentResolver::with_source(vars([(ENVIRONMENT_ENV, v)])),
            None => EnvironmentResolver::with_source(vars([("UNRELATED", "x")])),
        }
    }

    #[test]
    fn valid_values_resolve_to_themselves() {
        for env in Environment::ALL {
            assert_eq!(resolver_for(Some(env.as_str())).resolve(), env);
        }
    }

    #[test]
    fn unset_selector_resolves_to_development() {
        let (env, lines) = capture(|| resolver_for(None).resolve());
        assert_eq!(env, Environment::Development);
        assert!(lines.iter().any(|l| l.contains("Environment detected: development")));
    }

    #[test]
    fn invalid_value_falls_back_with_error_diagnostic() {
        let (env, lines) = capture(|| resolver_for(Some("qa")).resolve());
        assert_eq!(env, Environment::Development);
        assert!(lines
            .iter()
            .any(|l| l.contains("ERROR") && l.contains("Invalid environment: qa, defaulting to development")));
    }

    #[test]
    fn empty_value_is_invalid() {
        let (env, lines) = capture(|| resolver_for(Some("")).resolve());
        assert_eq!(env, Environment::Development);
        assert!(lines.iter().any(|l| l.contains("ERROR")));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(resolver_for(Some("Production")).resolve(), Environment::Development);
        assert_eq!(resolver_for(Some("prod")).resolve(), Environment::Development);
        assert!(!EnvironmentResolver::validate("STAGING"));
        assert!(EnvironmentResolver::validate("staging"));
    }

    #[test]
    fn strict_resolution_reports_invalid_value() {
        let err = resolver_for(Some("qa")).resolve_strict().unwrap_err();
        assert_eq!(err, ConfigError::InvalidEnvironment("qa".to_string()));
    }

    #[test]
    fn predicates_follow_resolution() {
        let prod = resolver_for(Some("production"));
        assert!(prod.is_production());
        assert!(!prod.is_development());
        assert!(!prod.is_staging());

        let staging = resolver_for(Some("staging"));
        assert!(staging.is_staging());
        assert!(!staging.is_production());

        assert!(resolver_for(Some("bogus")).is_development());
    }

    #[test]
    fn guard_propagates_configuration_failures() {
        let result = guard_environment(|| {
            Err(ConfigError::Configuration("missing suffix".to_string()).into())
        });
        assert_eq!(
            result,
            Err(ConfigError::Configuration("missing suffix".to_string()))
        );
    }

    #[test]
    fn guard_wraps_unexpected_failures() {
        let result = guard_environment(|| Err("disk on fire".into()));
        assert_eq!(
            result,
            Err(ConfigError::Configuration(
                "Environment management failed: disk on fire".to_string()
            ))
        );
    }

    #[test]
    fn guard_recovers_invalid_environment() {
        let result = guard_environment(|| {
            Err(ConfigError::InvalidEnvironment("qa".to_string()).into())
        });
        assert_eq!(result, Ok(Environment::Development));
    }

    #[test]
    fn display_uses_canonical_spelling() {
        assert_eq!(Environment::Staging.to_string(), "staging");
        assert_eq!(
            serde_json::to_string(&Environment::Production).unwrap(),
            "\"production\""
        );
    }
}
