#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tracing::span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

/// Captures tracing events during tests for verification.
///
/// Each captured event also carries the fields of every span it was emitted
/// in, so tests can assert on per-invocation scoping.
pub struct TestLogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
    pub span_fields: Vec<(String, String)>,
}

impl CapturedLog {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .chain(self.span_fields.iter())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl TestLogCapture {
    /// Start capturing on the current thread. Capture stops on drop.
    pub fn start() -> Self {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let layer = CaptureLayer {
            logs: Arc::clone(&logs),
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            logs,
            _guard: guard,
        }
    }

    /// Assert a message was logged containing the given substring.
    pub fn assert_logged(&self, needle: &str) {
        let logs = self.logs.lock().unwrap();
        assert!(
            logs.iter().any(|l| l.message.contains(needle)),
            "Expected log containing '{}'. Logged: {:#?}",
            needle,
            logs.iter().map(|l| &l.message).collect::<Vec<_>>()
        );
    }

    /// Assert a message was logged at the given level.
    pub fn assert_logged_at_level(&self, level: tracing::Level, needle: &str) {
        let logs = self.logs.lock().unwrap();
        assert!(
            logs.iter()
                .any(|l| l.level == level && l.message.contains(needle)),
            "Expected {} log containing '{}'. Logged: {:#?}",
            level,
            needle,
            logs.iter()
                .filter(|l| l.level == level)
                .map(|l| &l.message)
                .collect::<Vec<_>>()
        );
    }

    /// Assert no errors were logged.
    pub fn assert_no_errors(&self) {
        let logs = self.logs.lock().unwrap();
        let errors: Vec<_> = logs
            .iter()
            .filter(|l| l.level == tracing::Level::ERROR)
            .collect();
        assert!(errors.is_empty(), "Unexpected errors: {errors:#?}");
    }

    /// Assert an event or one of its spans carried `field_name` containing
    /// `field_value`.
    pub fn assert_field_logged(&self, field_name: &str, field_value: &str) {
        let logs = self.logs.lock().unwrap();
        assert!(
            logs.iter()
                .any(|l| l.field(field_name).is_some_and(|v| v.contains(field_value))),
            "Expected field {}={}. Logged fields: {:#?}",
            field_name,
            field_value,
            logs.iter().map(|l| (&l.fields, &l.span_fields)).collect::<Vec<_>>()
        );
    }

    /// Assert every event containing `needle` ran inside a span with
    /// `field_name = field_value`.
    pub fn assert_scoped(&self, needle: &str, field_name: &str, field_value: &str) {
        let logs = self.logs.lock().unwrap();
        let matching: Vec<_> = logs.iter().filter(|l| l.message.contains(needle)).collect();
        assert!(!matching.is_empty(), "No log containing '{needle}'");
        for log in matching {
            assert!(
                log.span_fields
                    .iter()
                    .any(|(k, v)| k == field_name && v == field_value),
                "Log '{}' not scoped to {}={}: {:?}",
                log.message,
                field_name,
                field_value,
                log.span_fields
            );
        }
    }

    /// Assert no captured message or field contains `needle`.
    pub fn assert_never_logged(&self, needle: &str) {
        let logs = self.logs.lock().unwrap();
        for log in logs.iter() {
            assert!(!log.message.contains(needle), "Leaked in message: {}", log.message);
            for (k, v) in log.fields.iter().chain(log.span_fields.iter()) {
                assert!(!v.contains(needle), "Leaked in field {k}: {v}");
            }
        }
    }

    /// Get all captured logs.
    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs.lock().unwrap().clone()
    }
}

struct SpanFields(Vec<(String, String)>);

struct CaptureLayer {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
}

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &span::Attributes<'_>,
        id: &span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut span_fields = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(fields.0.iter().cloned());
                }
            }
        }

        self.logs.lock().unwrap().push(CapturedLog {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
            span_fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}
