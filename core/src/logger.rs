//! Pluggable diagnostic output.
//!
//! The client only ever calls `Logger::debug`, once per request, before the
//! request is sent. Logging never influences control flow.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Discards everything. Default for new clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
}

/// Writes one `[LEVEL] message` line per call to a stream, stdout by default.
pub struct StandardLogger {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl StandardLogger {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    fn write_line(&self, level: &str, args: fmt::Arguments<'_>) {
        // A poisoned lock or a failed write only loses the line.
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "[{level}] {args}");
            let _ = sink.flush();
        }
    }
}

impl Default for StandardLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StandardLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardLogger").finish_non_exhaustive()
    }
}

impl Logger for StandardLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.write_line("DEBUG", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        self.write_line("INFO", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.write_line("ERROR", args);
    }
}

/// Forwards to `tracing` events under the `healthchecks_client` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "healthchecks_client", "{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "healthchecks_client", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "healthchecks_client", "{}", args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// `Write` handle over a buffer the test keeps a clone of.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn standard_logger_prefixes_severity() {
        let buf = SharedBuf::default();
        let logger = StandardLogger::with_writer(buf.clone());

        logger.debug(format_args!("HTTP {} {}", "GET", "/checks/"));
        logger.info(format_args!("ready"));
        logger.error(format_args!("failed: {}", 42));

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "[DEBUG] HTTP GET /checks/\n[INFO] ready\n[ERROR] failed: 42\n");
    }

    #[test]
    fn noop_and_tracing_loggers_accept_calls() {
        NoOpLogger.debug(format_args!("ignored"));
        TracingLogger.info(format_args!("no subscriber installed"));
    }
}
