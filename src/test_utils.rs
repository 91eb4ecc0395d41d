//! Test utilities for rsm-monitor.
//!
//! Provides portal response factories, test doubles for the secret store and
//! authenticator, a temp directory helper, and assertion macros.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rsm_monitor::test_utils::*;
//!
//! let body = enrollments_body(&[(101, "ENROLLED"), (102, "DROPPED")]);
//! let config = make_test_config("http://127.0.0.1:9999", &[163934]);
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use crate::auth::Authenticator;
use crate::core::{BearerToken, Credential};
use crate::error::{RsmError, Result};
use crate::secrets::SecretStore;
use crate::storage::Config;

// =============================================================================
// Portal Response Factories
// =============================================================================

/// One `studentEnrollments` row.
#[must_use]
pub fn make_test_enrollment(class_id: i64, state: &str) -> Value {
    json!({
        "id": class_id * 10,
        "registrationId": 1,
        "dateEnrolled": "2025-09-01",
        "dateCancelled": null,
        "state": state,
        "classId": class_id,
        "transferClassId": null,
        "semesterId": 2026,
        "stateChangedOn": "2025-09-01T00:00:00Z",
        "studentId": 0,
        "__typename": "StudentEnrollment"
    })
}

/// One `assignmentsForStudent` row.
#[must_use]
pub fn make_test_assignment(id: i64, score: Option<i64>) -> Value {
    json!({
        "assignmentItemCount": 10,
        "id": id,
        "createdOn": "2025-10-01T00:00:00Z",
        "context": {
            "classId": 0,
            "lessonNumber": id % 30,
            "lessonTopic": "Fractions",
            "title": format!("Lesson {}", id % 30),
            "__typename": "AssignmentContext"
        },
        "letterGrade": null,
        "score": score,
        "bonusScore": null,
        "hwAttachmentsState": "NONE",
        "__typename": "Assignment"
    })
}

/// GraphQL response body for `GetStudentEnrollments`.
#[must_use]
pub fn enrollments_body(rows: &[(i64, &str)]) -> Value {
    let rows: Vec<Value> = rows
        .iter()
        .map(|(class_id, state)| make_test_enrollment(*class_id, state))
        .collect();
    json!({ "data": { "studentEnrollments": rows } })
}

/// GraphQL response body for `GetStudentAssignments` with `count` rows.
#[must_use]
pub fn assignments_body(first_id: i64, count: usize) -> Value {
    let rows: Vec<Value> = (first_id..)
        .take(count)
        .map(|id| make_test_assignment(id, Some(9)))
        .collect();
    json!({ "data": { "assignmentsForStudent": rows } })
}

/// A JWT-shaped token whose `exp` is `exp` (unix seconds). Not signed.
#[must_use]
pub fn make_test_jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"parent","exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}

/// Default config pointed at `base_url`, harvesting `student_ids`.
#[must_use]
pub fn make_test_config(base_url: &str, student_ids: &[i64]) -> Config {
    let mut config = Config::default();
    config.portal.base_url = base_url.trim_end_matches('/').to_string();
    config.account.email = "parent@example.com".to_string();
    config.account.student_ids = student_ids.to_vec();
    config.general.timeout_seconds = 5;
    config
}

// =============================================================================
// Test Doubles
// =============================================================================

/// In-memory [`SecretStore`] that counts fetches.
#[derive(Debug, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
    fetches: Cell<usize>,
}

impl StaticSecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raw` under `secret_id`.
    #[must_use]
    pub fn with_secret(mut self, secret_id: &str, raw: &str) -> Self {
        self.secrets.insert(secret_id.to_string(), raw.to_string());
        self
    }

    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl SecretStore for StaticSecretStore {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, secret_id: &str) -> Result<String> {
        self.fetches.set(self.fetches.get() + 1);
        self.secrets.get(secret_id).cloned().ok_or_else(|| {
            RsmError::credential(format!("No password found for secret '{secret_id}'"))
        })
    }
}

/// [`Authenticator`] returning a fixed outcome and counting calls.
#[derive(Debug)]
pub struct FixedAuthenticator {
    token: Option<String>,
    message: String,
    calls: Cell<usize>,
}

impl FixedAuthenticator {
    /// Always succeed with `token`.
    #[must_use]
    pub fn token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            message: String::new(),
            calls: Cell::new(0),
        }
    }

    /// Always fail with an auth error carrying `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            token: None,
            message: message.to_string(),
            calls: Cell::new(0),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Authenticator for FixedAuthenticator {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn authenticate(&self, _credential: &Credential) -> Result<BearerToken> {
        self.calls.set(self.calls.get() + 1);
        self.token
            .as_deref()
            .map(BearerToken::new)
            .ok_or_else(|| RsmError::auth(self.message.clone()))
    }
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with `content`, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
        path
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string is valid JSON and matches the expected structure.
#[macro_export]
macro_rules! assert_json_eq {
    ($json:expr, $expected:expr) => {
        let json = $json;
        let parsed: serde_json::Value = serde_json::from_str(json).expect("Invalid JSON");
        let expected: serde_json::Value = $expected;
        assert_eq!(
            parsed,
            expected,
            "JSON mismatch\n\nExpected:\n{}\n\nActual:\n{}",
            serde_json::to_string_pretty(&expected).unwrap(),
            serde_json::to_string_pretty(&parsed).unwrap()
        );
    };
}
