//! Mock portal built on wiremock.
#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rsm_monitor::core::BearerToken;
use rsm_monitor::storage::PortalConfig;

pub const TEST_TOKEN: &str = "test-bearer-token";
pub const GRAPHQL_PATH: &str = "/parent-portal/graphql";

/// Portal config pointed at `server`.
pub fn portal_config(server: &MockServer) -> PortalConfig {
    PortalConfig {
        base_url: server.uri(),
        ..PortalConfig::default()
    }
}

pub fn test_token() -> BearerToken {
    BearerToken::new(TEST_TOKEN)
}

/// Respond to `GetStudentEnrollments` for `student_id`.
pub async fn mount_enrollments(server: &MockServer, student_id: i64, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({
            "operationName": "GetStudentEnrollments",
            "variables": { "studentId": student_id }
        })))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Respond to `GetStudentAssignments` for `student_id`/`class_id`.
pub async fn mount_assignments(
    server: &MockServer,
    student_id: i64,
    class_id: i64,
    response: ResponseTemplate,
) {
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({
            "operationName": "GetStudentAssignments",
            "variables": { "studentId": student_id, "classId": class_id }
        })))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// GraphQL requests the server received, as JSON, in arrival order.
pub async fn graphql_requests(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == GRAPHQL_PATH)
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}
