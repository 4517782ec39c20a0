//! Log capture for unit tests.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::environment::Environment;
use crate::layer::{Handler, LoggingSink};
use crate::policy::LogPolicy;
use crate::sink::MemorySink;

/// Run `f` with a thread-local subscriber that renders every event at
/// debug level and above in the human format, returning the lines.
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let memory = MemorySink::new();
    let sink = LoggingSink::new();
    sink.configure(Handler::new(
        LogPolicy::for_environment(Environment::Development),
        "test",
        Environment::Development,
        Arc::new(memory.clone()),
    ))
    .expect("memory sink is always ready");

    let result = tracing::subscriber::with_default(Registry::default().with(sink.layer()), f);
    (result, memory.lines())
}
