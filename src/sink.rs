use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for rendered log lines.
///
/// Implementations receive one fully rendered record per call, without
/// a trailing newline. The logging layer calls `write_line` on the
/// thread that emitted the event.
pub trait LogSink: Send + Sync {
    /// Check that the destination can accept lines.
    ///
    /// Called once while a handler is being bound to this sink; an error
    /// here aborts the binding and selects the fallback configuration.
    ///
    /// Default implementation always succeeds.
    fn ready(&self) -> io::Result<()> {
        Ok(())
    }

    /// Write a single rendered record.
    fn write_line(&self, line: &str) -> io::Result<()>;

    /// Flush any buffered output. Called when the handler using this sink
    /// is replaced.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

/// Writes each line to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stderr().lock();
        writeln!(out, "{}", line)
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Keeps lines in memory.
///
/// Clones share the same buffer, so a caller can hand one clone to the
/// initializer and read the captured output through another.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }
}
