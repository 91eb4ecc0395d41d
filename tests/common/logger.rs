//! Structured per-test logging.
#![allow(dead_code)]
//!
//! `TestLogger` prints phase markers and timings for a test to stderr, which
//! cargo shows only for failing tests.
//!
//! # Environment Variables
//!
//! - `TEST_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! - `TEST_LOG_JSON` - "1" or "true" for one JSON object per line

use std::env;
use std::fmt::Display;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;

use super::log_capture::TestLogCapture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            _ => None,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    test: &'a str,
    level: LogLevel,
    phase: Option<String>,
    message: &'a str,
    elapsed_ms: u64,
}

struct Settings {
    min_level: LogLevel,
    json: bool,
}

fn settings() -> &'static Settings {
    static SETTINGS: OnceLock<Settings> = OnceLock::new();
    SETTINGS.get_or_init(|| Settings {
        min_level: env::var("TEST_LOG_LEVEL")
            .ok()
            .and_then(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Info),
        json: env::var("TEST_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
    })
}

/// Logger scoped to one test.
pub struct TestLogger {
    name: String,
    start: Instant,
    phase: std::sync::Mutex<Option<String>>,
    requests: AtomicUsize,
}

impl TestLogger {
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            name: test_name.to_string(),
            start: Instant::now(),
            phase: std::sync::Mutex::new(None),
            requests: AtomicUsize::new(0),
        };
        logger.info("start");
        logger
    }

    /// Logger plus a tracing capture active on the current thread.
    pub fn with_capture(test_name: &str) -> (Self, TestLogCapture) {
        (Self::new(test_name), TestLogCapture::start())
    }

    pub fn phase(&self, phase: &str) {
        *self.phase.lock().unwrap() = Some(phase.to_string());
        self.log(LogLevel::Debug, &format!("phase: {phase}"));
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn http_request(&self, method: &str, url: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.log(LogLevel::Debug, &format!("{method} {url}"));
    }

    pub fn finish_ok(&self) {
        self.info(&format!(
            "ok ({} ms, {} requests)",
            self.elapsed_ms(),
            self.requests.load(Ordering::Relaxed)
        ));
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn log(&self, level: LogLevel, message: &str) {
        let settings = settings();
        if level < settings.min_level {
            return;
        }
        let phase = self.phase.lock().unwrap().clone();
        if settings.json {
            let entry = LogEntry {
                test: &self.name,
                level,
                phase,
                message,
                elapsed_ms: self.elapsed_ms(),
            };
            eprintln!("{}", serde_json::to_string(&entry).unwrap());
        } else {
            let phase = phase.map(|p| format!("[{p}] ")).unwrap_or_default();
            eprintln!("{level:>5} {}: {phase}{message}", self.name);
        }
    }
}
