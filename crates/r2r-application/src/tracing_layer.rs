//! Tracing layer that forwards log events to a channel.
//!
//! Lets a front end show diagnostics (for example the cause of a transport
//! failure, which the workflow only logs) without scraping log files.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// A captured log event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosticEvent {
    /// Event target (e.g. "r2r_application::workflow_controller")
    pub target: String,
    /// Log level (INFO, WARN, ERROR, ...)
    pub level: String,
    pub message: String,
    /// Structured fields, `message` included
    pub fields: HashMap<String, Value>,
    /// Name of the innermost span, if any
    pub span: Option<String>,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl DiagnosticEvent {
    /// String value of a field, if it was recorded as one.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

pub struct DiagnosticsLayer {
    sender: mpsc::UnboundedSender<DiagnosticEvent>,
    min_level: Level,
}

impl DiagnosticsLayer {
    /// Forwards events at `min_level` or more severe.
    pub fn new(sender: mpsc::UnboundedSender<DiagnosticEvent>, min_level: Level) -> Self {
        Self { sender, min_level }
    }
}

impl<S> Layer<S> for DiagnosticsLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Level ordering: ERROR < WARN < ... < TRACE
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut fields = FieldMap::default();
        event.record(&mut fields);

        let span = ctx
            .event_span(event)
            .map(|span| span.name().to_string());

        let diagnostic = DiagnosticEvent {
            target: event.metadata().target().to_string(),
            level: event.metadata().level().to_string(),
            message: fields.message(),
            fields: fields.0,
            span,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Receiver gone: drop the event
        let _ = self.sender.send(diagnostic);
    }
}

/// Collects event fields as JSON values. Numbers and booleans keep their
/// type; anything formatted (`%value`, `?value`, the message) becomes a string.
#[derive(Default)]
struct FieldMap(HashMap<String, Value>);

impl FieldMap {
    fn insert(&mut self, field: &Field, value: impl Into<Value>) {
        self.0.insert(field.name().to_string(), value.into());
    }

    fn message(&self) -> String {
        self.0
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl Visit for FieldMap {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}
