//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the ambient `tracing` subscriber for process diagnostics
//! - Emit one JSON record per request-lifecycle event via [`StructuredLogger`]
//! - Map `LOG_LEVEL` names onto `tracing::Level`
//!
//! # Design Decisions
//! - The request logger is constructed once and passed in, never global
//! - Fixed fields (timestamp, level, message, request_id, duration_ms) win
//!   over caller fields with the same key
//! - Logging never fails a request: write and encode errors are dropped

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig, ServiceConfig};
use crate::observability::context::{utc_timestamp, RequestContext};

/// Parse a level name as used by `LOG_LEVEL`.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" | "CRITICAL" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize the process-wide `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    let level = parse_level(&config.level).unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Writes single-line JSON records for request-lifecycle events.
pub struct StructuredLogger {
    name: String,
    min_level: Level,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl StructuredLogger {
    pub fn new(name: impl Into<String>, min_level: Level, writer: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.into(),
            min_level,
            writer: Mutex::new(writer),
        }
    }

    /// Logger writing to the process's standard output.
    pub fn stdout(name: impl Into<String>, min_level: Level) -> Self {
        Self::new(name, min_level, Box::new(io::stdout()))
    }

    /// Stdout logger configured from the service and logging sections.
    pub fn from_config(service: &ServiceConfig, logging: &LoggingConfig) -> Self {
        let level = parse_level(&logging.level).unwrap_or(Level::INFO);
        Self::stdout(service.name.clone(), level)
    }

    /// Logger capturing records in memory.
    pub fn in_memory(name: impl Into<String>, min_level: Level) -> (Self, LogCapture) {
        let capture = LogCapture::default();
        (Self::new(name, min_level, Box::new(capture.clone())), capture)
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.min_level
    }

    /// Build the record for one event without writing it.
    pub fn build_record(
        &self,
        level: Level,
        message: &str,
        context: Option<&RequestContext>,
        fields: Option<Value>,
    ) -> Map<String, Value> {
        let mut record = match fields {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("fields".to_string(), other);
                map
            }
        };

        record.insert("timestamp".to_string(), json!(utc_timestamp()));
        record.insert("level".to_string(), json!(level.as_str()));
        record.insert("logger".to_string(), json!(self.name));
        record.insert("message".to_string(), json!(message));

        if let Some(ctx) = context {
            record.insert("request_id".to_string(), json!(ctx.correlation_id()));
            let duration_ms = ctx.elapsed_ms().unwrap_or_else(|| ctx.elapsed_so_far());
            record.insert("duration_ms".to_string(), json!(duration_ms));
        }

        record
    }

    /// Emit one record if `level` passes the filter.
    pub fn emit(
        &self,
        level: Level,
        message: &str,
        context: Option<&RequestContext>,
        fields: Option<Value>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let record = self.build_record(level, message, context, fields);
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(_) => json!({ "level": level.as_str(), "message": message }).to_string(),
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }

    pub fn debug(&self, message: &str, context: Option<&RequestContext>, fields: Option<Value>) {
        self.emit(Level::DEBUG, message, context, fields);
    }

    pub fn info(&self, message: &str, context: Option<&RequestContext>, fields: Option<Value>) {
        self.emit(Level::INFO, message, context, fields);
    }

    pub fn warn(&self, message: &str, context: Option<&RequestContext>, fields: Option<Value>) {
        self.emit(Level::WARN, message, context, fields);
    }

    pub fn error(&self, message: &str, context: Option<&RequestContext>, fields: Option<Value>) {
        self.emit(Level::ERROR, message, context, fields);
    }
}

/// In-memory sink shared between a logger and its reader.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Every captured line decoded as JSON. Undecodable lines are skipped.
    pub fn records(&self) -> Vec<Value> {
        let bytes = match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(_) => return Vec::new(),
        };
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Records whose `message` equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == message)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.buffer.lock() {
            Ok(mut buffer) => {
                buffer.extend_from_slice(buf);
                Ok(buf.len())
            }
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "log capture poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info"), Some(Level::INFO));
        assert_eq!(parse_level("WARNING"), Some(Level::WARN));
        assert_eq!(parse_level("critical"), Some(Level::ERROR));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_record_has_fixed_fields_and_context() {
        let (logger, capture) = StructuredLogger::in_memory("echo_api", Level::INFO);
        let ctx = RequestContext::with_id("abc-123");

        logger.info("Incoming request", Some(&ctx), Some(json!({ "path": "/hello" })));

        let records = capture.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["message"], "Incoming request");
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["logger"], "echo_api");
        assert_eq!(record["request_id"], "abc-123");
        assert_eq!(record["path"], "/hello");
        assert!(record["duration_ms"].as_f64().unwrap() >= 0.0);
        assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_fixed_fields_win_on_collision() {
        let (logger, capture) = StructuredLogger::in_memory("echo_api", Level::INFO);
        let ctx = RequestContext::begin(&HeaderMap::new());

        logger.warn(
            "real message",
            Some(&ctx),
            Some(json!({ "message": "spoofed", "request_id": "spoofed", "extra": 1 })),
        );

        let record = &capture.records()[0];
        assert_eq!(record["message"], "real message");
        assert_eq!(record["request_id"], ctx.correlation_id());
        assert_eq!(record["extra"], 1);
    }

    #[test]
    fn test_level_filter() {
        let (logger, capture) = StructuredLogger::in_memory("echo_api", Level::WARN);
        logger.info("dropped", None, None);
        logger.debug("dropped", None, None);
        logger.error("kept", None, None);

        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "kept");
        assert!(records[0].get("request_id").is_none());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let logger = StructuredLogger::new("echo_api", Level::INFO, Box::new(FailingWriter));
        logger.error("nobody hears this", None, Some(json!({ "k": "v" })));
    }
}
