//! Portal data harvester.
//!
//! For each student: fetch enrollments, keep the `ENROLLED` classes, fetch
//! each class's assignments, and collect the non-empty lists. Per-call
//! failures (non-200, missing or malformed data) are logged and skipped.
//! Only transport failures and a rejected session abort the harvest.

pub mod queries;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::core::http::{build_session_client, transport_error};
use crate::core::{Assignment, BearerToken, Enrollment, HarvestResult, StudentAssignments, enrolled_class_ids};
use crate::error::{RsmError, Result};
use crate::storage::PortalConfig;

use queries::{ASSIGNMENTS_FIELD, ENROLLMENTS_FIELD, GraphQlRequest};

/// Status and parsed body of one GraphQL call.
#[derive(Debug)]
pub struct GraphQlReply {
    pub status: StatusCode,
    /// `None` when the body is not JSON.
    pub body: Option<Value>,
}

impl GraphQlReply {
    /// Raw rows of the `data.<field>` array.
    ///
    /// `None` when the field is absent, null, or not an array. Rows are not
    /// inspected here.
    #[must_use]
    pub fn rows(&self, field: &str) -> Option<Vec<Value>> {
        match self.body.as_ref()?.get("data")?.get(field)? {
            Value::Array(rows) => Some(rows.clone()),
            _ => None,
        }
    }

    /// Messages of a non-empty top-level `errors` array.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.body
            .as_ref()
            .and_then(|b| b.get("errors"))
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(Value::as_str)
                            .map_or_else(|| e.to_string(), str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// An authenticated HTTP session against the portal's GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct PortalSession {
    client: Client,
    graphql_url: String,
    timeout: Duration,
}

impl PortalSession {
    /// Build a session carrying `token` and the portal's fixed headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers are invalid or the client cannot be
    /// built.
    pub fn new(token: &BearerToken, portal: &PortalConfig, timeout: Duration) -> Result<Self> {
        let client = build_session_client(token, &portal.origin(), &portal.referer_url(), timeout)?;
        Ok(Self {
            client,
            graphql_url: portal.graphql_url(),
            timeout,
        })
    }

    #[must_use]
    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// POST one GraphQL request.
    ///
    /// # Errors
    ///
    /// Returns a transport error on connection failure, timeout, unreadable
    /// body, or HTTP 401.
    pub async fn post<V: Serialize>(&self, request: &GraphQlRequest<V>) -> Result<GraphQlReply> {
        let resp = self
            .client
            .post(&self.graphql_url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RsmError::transport(format!(
                "session rejected by portal (HTTP 401) during {}",
                request.operation_name
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;
        let body = serde_json::from_str(&text).ok();

        Ok(GraphQlReply { status, body })
    }
}

/// Query parameters for a harvest.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub academic_end_year: i32,
    pub assignment_types: Vec<String>,
}

impl From<&PortalConfig> for HarvestSettings {
    fn from(portal: &PortalConfig) -> Self {
        Self {
            academic_end_year: portal.academic_end_year,
            assignment_types: portal.assignment_types.clone(),
        }
    }
}

/// Walks enrollments and assignments for a list of students.
pub struct Harvester<'a> {
    session: &'a PortalSession,
    settings: HarvestSettings,
}

impl<'a> Harvester<'a> {
    #[must_use]
    pub const fn new(session: &'a PortalSession, settings: HarvestSettings) -> Self {
        Self { session, settings }
    }

    /// Harvest every student in `student_ids`, in order.
    ///
    /// Each student gets an entry even when nothing could be fetched.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the portal is unreachable or rejects
    /// the session. Nothing partial is returned in that case.
    pub async fn harvest(&self, student_ids: &[i64]) -> Result<HarvestResult> {
        let mut result = HarvestResult::new();

        for &student_id in student_ids {
            tracing::info!(student_id, "Processing student");
            let enrollments = self.fetch_enrollments(student_id).await?;
            let class_ids = enrolled_class_ids(&enrollments);
            let unusable = enrollments
                .iter()
                .filter(|e| e.is_enrolled() && e.class_id().is_none())
                .count();
            if unusable > 0 {
                tracing::warn!(student_id, skipped = unusable, "Enrolled rows without a usable classId");
            }
            tracing::info!(student_id, enrolled_classes = class_ids.len(), "Enrolled classes");

            let mut entry = StudentAssignments::new(student_id);
            for class_id in class_ids {
                let Some(assignments) = self.fetch_assignments(student_id, class_id).await? else {
                    continue;
                };
                if assignments.is_empty() {
                    tracing::debug!(student_id, class_id, "No assignments");
                    continue;
                }
                tracing::info!(student_id, class_id, assignments = assignments.len(), "Assignments fetched");
                entry.insert_class(class_id, assignments);
            }
            result.insert_student(entry);
        }

        tracing::info!(
            students = result.student_count(),
            total_assignments = result.total_assignments(),
            "Harvest complete"
        );
        Ok(result)
    }

    async fn fetch_enrollments(&self, student_id: i64) -> Result<Vec<Enrollment>> {
        let request = queries::enrollments(student_id, self.settings.academic_end_year);
        let reply = self.session.post(&request).await?;
        log_graphql_errors(&reply, request.operation_name, student_id, None);

        if reply.status != StatusCode::OK {
            tracing::error!(student_id, status = reply.status.as_u16(), "Failed to get enrollments");
            return Ok(Vec::new());
        }
        let Some(rows) = reply.rows(ENROLLMENTS_FIELD) else {
            tracing::warn!(student_id, "Enrollment response has no usable data");
            return Ok(Vec::new());
        };
        Ok(parse_rows(rows, Enrollment::from_row, student_id, None))
    }

    /// `None` means the class is skipped.
    async fn fetch_assignments(&self, student_id: i64, class_id: i64) -> Result<Option<Vec<Assignment>>> {
        let request = queries::assignments(student_id, class_id, &self.settings.assignment_types);
        let reply = self.session.post(&request).await?;
        log_graphql_errors(&reply, request.operation_name, student_id, Some(class_id));

        if reply.status != StatusCode::OK {
            tracing::error!(
                student_id,
                class_id,
                status = reply.status.as_u16(),
                "Failed to get assignments"
            );
            return Ok(None);
        }
        let Some(rows) = reply.rows(ASSIGNMENTS_FIELD) else {
            tracing::warn!(student_id, class_id, "Assignment response has no usable data");
            return Ok(Some(Vec::new()));
        };
        Ok(Some(parse_rows(rows, Assignment::from_row, student_id, Some(class_id))))
    }
}

/// Keep the rows `parse` accepts; count and log the rest.
fn parse_rows<T>(
    rows: Vec<Value>,
    parse: impl Fn(Value) -> Option<T>,
    student_id: i64,
    class_id: Option<i64>,
) -> Vec<T> {
    let total = rows.len();
    let parsed: Vec<T> = rows.into_iter().filter_map(parse).collect();
    let skipped = total - parsed.len();
    if skipped > 0 {
        tracing::warn!(student_id, class_id = ?class_id, skipped, "Skipped malformed rows");
    }
    parsed
}

fn log_graphql_errors(reply: &GraphQlReply, operation: &str, student_id: i64, class_id: Option<i64>) {
    let messages = reply.error_messages();
    if let Some(first) = messages.first() {
        tracing::warn!(
            operation,
            student_id,
            class_id = ?class_id,
            count = messages.len(),
            first = %first,
            "GraphQL errors in response"
        );
    }
}
