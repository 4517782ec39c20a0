use crate::environment::Environment;
use crate::error::LoggingError;
use crate::policy::{level_name, LogPolicy};
use crate::record::LogRecord;
use crate::sink::{LogSink, StderrSink};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Registry;

/// Lifecycle of a [`LoggingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Unconfigured,
    Configuring,
    Configured,
    Fallback,
}

/// The single handler bound to a sink: policy, context tag and writer.
pub struct Handler {
    pub policy: LogPolicy,
    pub service: String,
    pub environment: String,
    writer: Arc<dyn LogSink>,
}

impl Handler {
    pub fn new(
        policy: LogPolicy,
        service: impl Into<String>,
        environment: Environment,
        writer: Arc<dyn LogSink>,
    ) -> Self {
        Handler {
            policy,
            service: service.into(),
            environment: environment.to_string(),
            writer,
        }
    }

    fn fallback(writer: Arc<dyn LogSink>) -> Self {
        Handler {
            policy: LogPolicy::fallback(),
            service: String::new(),
            environment: String::new(),
            writer,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("policy", &self.policy)
            .field("service", &self.service)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Most events held while no handler is bound; later ones are dropped.
const MAX_HELD: usize = 64;

struct Slot {
    state: SinkState,
    handler: Option<Arc<Handler>>,
    held: Vec<HeldEvent>,
}

/// An event captured while no handler was bound, replayed through the
/// next handler that gets bound.
struct HeldEvent {
    timestamp: DateTime<Utc>,
    level: Level,
    target: String,
    fields: EventFields,
}

/// Owned logging sink holding at most one active [`Handler`].
///
/// Binding a handler replaces whatever was bound before, so repeated
/// configuration never duplicates output. Clones share the same slot.
/// Events that arrive while nothing is bound are held and replayed once
/// a handler (or the fallback) is bound.
#[derive(Clone)]
pub struct LoggingSink {
    slot: Arc<Mutex<Slot>>,
    fallback_writer: Arc<dyn LogSink>,
    global: bool,
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingSink")
            .field("state", &self.state())
            .field("global", &self.global)
            .finish_non_exhaustive()
    }
}

impl LoggingSink {
    /// A sink that is not attached to any subscriber; compose it with
    /// [`LoggingSink::layer`].
    pub fn new() -> Self {
        Self::with_fallback_writer(Arc::new(StderrSink))
    }

    /// Like [`LoggingSink::new`] with a custom destination for the
    /// fallback configuration (stderr by default).
    pub fn with_fallback_writer(fallback_writer: Arc<dyn LogSink>) -> Self {
        LoggingSink {
            slot: Arc::new(Mutex::new(Slot {
                state: SinkState::Unconfigured,
                handler: None,
                held: Vec::new(),
            })),
            fallback_writer,
            global: false,
        }
    }

    /// The process-wide sink. Its layer is installed as the global
    /// `tracing` subscriber the first time it is attached.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<LoggingSink> = OnceLock::new();
        GLOBAL
            .get_or_init(|| LoggingSink {
                global: true,
                ..LoggingSink::new()
            })
            .clone()
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Make sure events reach this sink. For the global sink that means
    /// installing its layer as the process default subscriber; local sinks
    /// are composed by the caller and need nothing.
    pub fn attach(&self) -> Result<(), LoggingError> {
        if self.global {
            install_global(self)
        } else {
            Ok(())
        }
    }

    /// `tracing_subscriber` layer that renders events through this sink's
    /// current handler.
    pub fn layer(&self) -> SinkLayer {
        SinkLayer { sink: self.clone() }
    }

    pub fn state(&self) -> SinkState {
        self.lock_recover().state
    }

    /// Currently bound handler, if any.
    pub fn handler(&self) -> Option<Arc<Handler>> {
        self.lock_recover().handler.clone()
    }

    /// Number of bound handlers; never more than one.
    pub fn handler_count(&self) -> usize {
        usize::from(self.lock_recover().handler.is_some())
    }

    /// Replace the bound handler with `handler`.
    ///
    /// The previous handler is unbound and its writer flushed first. The new writer is
    /// checked with the lock released, so a writer may log from `ready()`;
    /// on error the sink is left in [`SinkState::Configuring`] with nothing
    /// bound until [`LoggingSink::install_fallback`] runs.
    pub fn configure(&self, handler: Handler) -> Result<(), LoggingError> {
        self.attach()?;

        let previous = {
            let mut slot = self.lock_recover();
            slot.state = SinkState::Configuring;
            slot.handler.take()
        };
        flush_replaced(previous);

        handler.writer.ready()?;

        self.bind(Arc::new(handler), SinkState::Configured);
        Ok(())
    }

    /// Bind the minimal plain-text, info-level handler. Never fails.
    pub fn install_fallback(&self) {
        if let Err(e) = self.attach() {
            eprintln!("fallback logging not installed globally: {}", e);
        }

        let fallback = Arc::new(Handler::fallback(Arc::clone(&self.fallback_writer)));
        self.bind(fallback, SinkState::Fallback);
    }

    /// Swap `handler` in, then replay whatever was held while nothing was
    /// bound. The replay runs with the lock released.
    fn bind(&self, handler: Arc<Handler>, state: SinkState) {
        let (previous, held) = {
            let mut slot = self.lock_recover();
            let previous = slot.handler.replace(Arc::clone(&handler));
            slot.state = state;
            (previous, std::mem::take(&mut slot.held))
        };
        flush_replaced(previous);
        for event in held {
            write_event(&handler, event);
        }
    }

    /// The handler to write `event` with, or `None` when nothing is bound
    /// and the event was held instead.
    fn route(&self, event: HeldEvent) -> Option<(Arc<Handler>, HeldEvent)> {
        let mut slot = self.lock_recover();
        match slot.handler.clone() {
            Some(handler) => Some((handler, event)),
            None => {
                if slot.held.len() < MAX_HELD {
                    slot.held.push(event);
                }
                None
            }
        }
    }

    /// Lock the slot, recovering it if a previous holder panicked. The slot
    /// is only ever left between two consistent states, so the data behind
    /// a poisoned lock is still usable.
    fn lock_recover(&self) -> MutexGuard<'_, Slot> {
        match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => {
                self.slot.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

fn flush_replaced(previous: Option<Arc<Handler>>) {
    if let Some(previous) = previous {
        if let Err(e) = previous.writer.flush() {
            eprintln!("error flushing replaced log sink: {}", e);
        }
    }
}

/// Install the global sink's layer as the process default subscriber.
///
/// Only the first call attempts the installation; its outcome is
/// remembered, so a subscriber installed by someone else keeps failing
/// every later configuration.
fn install_global(sink: &LoggingSink) -> Result<(), LoggingError> {
    static INSTALLED: OnceLock<Result<(), String>> = OnceLock::new();
    INSTALLED
        .get_or_init(|| {
            let subscriber = Registry::default().with(sink.layer());
            tracing::subscriber::set_global_default(subscriber).map_err(|e| e.to_string())
        })
        .clone()
        .map_err(LoggingError::GlobalInstall)
}

/// `tracing_subscriber` layer that renders each event with the handler
/// currently bound to its [`LoggingSink`].
///
/// Events below the handler's level are dropped; with no handler bound
/// they are held for the next one.
pub struct SinkLayer {
    sink: LoggingSink,
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut fields = EventFields::default();
        event.record(&mut FieldVisitor { fields: &mut fields });

        let event = HeldEvent {
            timestamp: Utc::now(),
            level: *meta.level(),
            target: meta.target().to_string(),
            fields,
        };
        if let Some((handler, event)) = self.sink.route(event) {
            write_event(&handler, event);
        }
    }
}

/// Render `event` with `handler` and write it, unless it is below the
/// handler's level.
fn write_event(handler: &Handler, event: HeldEvent) {
    if !handler.policy.level.allows(&event.level) {
        return;
    }

    let HeldEvent {
        timestamp,
        level,
        target,
        fields,
    } = event;
    let record = LogRecord {
        timestamp,
        level: level_name(&level),
        service: fields.service.unwrap_or_else(|| handler.service.clone()),
        environment: fields
            .environment
            .unwrap_or_else(|| handler.environment.clone()),
        message: fields.message.unwrap_or_default(),
        exception: fields.exception,
        user_id: fields.user_id,
        request_id: fields.request_id,
        logger: fields.logger.unwrap_or(target),
    };

    let line = match record.render(handler.policy.format) {
        Ok(line) => line,
        Err(e) => {
            eprintln!("error rendering log record: {}", e);
            return;
        }
    };
    if let Err(e) = handler.writer.write_line(&line) {
        eprintln!("error writing log record: {}", e);
    }
}

/// Event fields that map onto [`LogRecord`] attributes. Anything else is
/// ignored.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    logger: Option<String>,
    service: Option<String>,
    environment: Option<String>,
    exception: Option<String>,
    user_id: Option<String>,
    request_id: Option<String>,
}

struct FieldVisitor<'a> {
    fields: &'a mut EventFields,
}

impl FieldVisitor<'_> {
    fn set(&mut self, field: &Field, value: String) {
        let slot = match field.name() {
            "message" => &mut self.fields.message,
            "logger" => &mut self.fields.logger,
            "service" => &mut self.fields.service,
            "environment" => &mut self.fields.environment,
            "exception" | "error" => &mut self.fields.exception,
            "user_id" => &mut self.fields.user_id,
            "request_id" => &mut self.fields.request_id,
            _ => return,
        };
        *slot = Some(value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.set(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.set(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.set(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let mut text = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            text.push_str(&format!("\nCaused by: {}", cause));
            source = cause.source();
        }
        self.set(field, text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field, format!("{:?}", value));
    }
}
