use std::sync::Arc;

use env_log_policy::env::{vars, ENVIRONMENT_ENV};
use env_log_policy::layer::{LoggingSink, SinkState};
use env_log_policy::sink::MemorySink;
use env_log_policy::{EnvironmentResolver, LogFormat, LoggingInitializer};

fn initializer(env: &str, output: &MemorySink) -> LoggingInitializer {
    LoggingInitializer::new()
        .with_resolver(EnvironmentResolver::with_source(vars([(ENVIRONMENT_ENV, env)])))
        .with_writer(Arc::new(output.clone()))
}

// The global subscriber can only be installed once per process, so the
// whole lifecycle runs in a single test.
#[test]
fn global_sink_lifecycle() {
    let sink = LoggingSink::global();
    assert!(sink.is_global());
    assert_eq!(sink.state(), SinkState::Unconfigured);

    // The first initialization installs the global subscriber; what the
    // resolver reported before the handler was bound must still show up.
    let invalid = MemorySink::new();
    let handle = initializer("qa", &invalid).initialize("healthmate-core");
    assert!(handle.is_live());
    assert_eq!(handle.controller().unwrap().format(), LogFormat::Human);
    let lines = invalid.lines();
    assert!(lines
        .iter()
        .any(|l| l.contains(" - ERROR - [healthmate-core:development] - Invalid environment: qa, defaulting to development")));
    assert!(lines
        .iter()
        .any(|l| l.contains("Log level set to DEBUG for environment development")));

    let staging = MemorySink::new();
    let handle = initializer("staging", &staging).initialize("healthmate-core");
    assert!(handle.is_live());
    assert_eq!(handle.controller().unwrap().format(), LogFormat::Structured);
    assert_eq!(sink.state(), SinkState::Configured);

    let logger = handle.logger("stack").unwrap().with_request_id("r-1");
    logger.info("exports created");

    let lines = staging.lines();
    let last: serde_json::Value = serde_json::from_str(lines.last().unwrap()).unwrap();
    assert_eq!(last["message"], "exports created");
    assert_eq!(last["service"], "healthmate-core");
    assert_eq!(last["environment"], "staging");
    assert_eq!(last["request_id"], "r-1");
    assert!(last.get("user_id").is_none());

    let development = MemorySink::new();
    let handle = initializer("development", &development).initialize("healthmate-core");
    assert_eq!(handle.controller().unwrap().format(), LogFormat::Human);
    assert_eq!(sink.handler_count(), 1);

    staging.clear();
    development.clear();
    tracing::warn!("after reinitialization");

    assert!(staging.lines().is_empty());
    assert!(!invalid.lines().iter().any(|l| l.contains("after reinitialization")));
    let lines = development.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(" - WARNING - [healthmate-core:development] - after reinitialization"));
}
