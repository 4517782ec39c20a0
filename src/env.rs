//! Environment variable names read by the resolver, plus a small seam
//! over where those variables come from.
//!
//! Production code always reads the process environment; tests hand in
//! a map so they never have to mutate process-wide state.
use std::collections::HashMap;

/// Selects the named environment (`development`, `staging`, `production`).
pub const ENVIRONMENT_ENV: &str = "HEALTHMATE_ENV";

/// AWS-style region identifier used for region-scoped resources.
pub const REGION_ENV: &str = "AWS_REGION";

/// Region used when [`REGION_ENV`] is not set.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Source of configuration variables.
///
/// Every call re-reads the underlying source; nothing is cached.
pub trait VarSource: Send + Sync {
    /// Value of `key`, or `None` when it is not set.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<V: VarSource + ?Sized> VarSource for &V {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Read a variable from `source` or fall back to a provided default.
pub fn env_or(source: &dyn VarSource, key: &str, default: &str) -> String {
    source.var(key).unwrap_or_else(|| default.to_string())
}

/// Build an in-memory [`VarSource`] from key/value pairs.
pub fn vars<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
