//! Core data models for the portal harvest.
//!
//! Enrollment and assignment records mirror the portal's GraphQL payloads.
//! Assignments keep every field the portal returns so the response envelope
//! carries them verbatim.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Credential
// =============================================================================

/// Account identifier plus secret. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account: String,
    pub secret: String,
}

impl Credential {
    #[must_use]
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Enrollment
// =============================================================================

/// Portal-defined registration status of a student in a class.
///
/// Only [`EnrollmentState::Enrolled`] is actionable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnrollmentState {
    Enrolled,
    Other(String),
}

impl EnrollmentState {
    pub const ENROLLED: &'static str = "ENROLLED";

    #[must_use]
    pub const fn is_enrolled(&self) -> bool {
        matches!(self, Self::Enrolled)
    }
}

impl From<String> for EnrollmentState {
    fn from(value: String) -> Self {
        if value == Self::ENROLLED {
            Self::Enrolled
        } else {
            Self::Other(value)
        }
    }
}

impl From<EnrollmentState> for String {
    fn from(value: EnrollmentState) -> Self {
        match value {
            EnrollmentState::Enrolled => EnrollmentState::ENROLLED.to_string(),
            EnrollmentState::Other(other) => other,
        }
    }
}

/// Integer id from a JSON number or a numeric string (GraphQL `ID`).
fn as_id(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// One row of `studentEnrollments`, kept as the portal sent it.
///
/// Only `classId` and `state` are interpreted; every other field may carry
/// any JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Enrollment(Map<String, Value>);

impl Enrollment {
    /// Wrap a response row. `None` unless the row is a JSON object.
    #[must_use]
    pub fn from_row(row: Value) -> Option<Self> {
        match row {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    #[must_use]
    pub fn class_id(&self) -> Option<i64> {
        self.0.get("classId").and_then(as_id)
    }

    #[must_use]
    pub fn state(&self) -> Option<EnrollmentState> {
        self.0
            .get("state")
            .and_then(Value::as_str)
            .map(|s| EnrollmentState::from(s.to_string()))
    }

    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.state().is_some_and(|s| s.is_enrolled())
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Class ids of the `ENROLLED` entries, in response order.
///
/// Duplicates are kept. An `ENROLLED` row without a usable `classId` is
/// dropped; callers that care compare against [`Enrollment::is_enrolled`].
#[must_use]
pub fn enrolled_class_ids(enrollments: &[Enrollment]) -> Vec<i64> {
    enrollments
        .iter()
        .filter(|e| e.is_enrolled())
        .filter_map(Enrollment::class_id)
        .collect()
}

// =============================================================================
// Assignment
// =============================================================================

/// Lesson an assignment belongs to, read from its `context` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonContext {
    pub class_id: Option<i64>,
    pub lesson_number: Option<i64>,
    pub lesson_topic: Option<String>,
    pub title: Option<String>,
}

impl LessonContext {
    fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            class_id: fields.get("classId").and_then(as_id),
            lesson_number: fields.get("lessonNumber").and_then(as_id),
            lesson_topic: text("lessonTopic"),
            title: text("title"),
        }
    }
}

/// One row of `assignmentsForStudent`.
///
/// Serialized exactly as received, field order included. Typed views are
/// read on demand and are `None` when the portal sent another shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(Map<String, Value>);

impl Assignment {
    /// Wrap a response row. `None` unless the row is a JSON object.
    #[must_use]
    pub fn from_row(row: Value) -> Option<Self> {
        match row {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The `id` field, whatever its JSON type.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    /// Numeric score; `None` for a missing, null or non-numeric score.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.0.get("score").and_then(Value::as_f64)
    }

    #[must_use]
    pub fn letter_grade(&self) -> Option<&str> {
        self.0.get("letterGrade").and_then(Value::as_str)
    }

    #[must_use]
    pub fn context(&self) -> Option<LessonContext> {
        self.0
            .get("context")
            .and_then(Value::as_object)
            .map(LessonContext::from_fields)
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

// =============================================================================
// Harvest Result
// =============================================================================

/// Key under which a student appears in the result.
#[must_use]
pub fn student_key(student_id: i64) -> String {
    format!("Student_{student_id}")
}

/// Key under which a class appears in a student's entry.
#[must_use]
pub fn class_key(class_id: i64) -> String {
    format!("Class_{class_id}")
}

/// Assignments harvested for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAssignments {
    pub class_id: i64,
    pub assignments: Vec<Assignment>,
}

/// Classes harvested for one student, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAssignments {
    pub student_id: i64,
    pub classes: Vec<ClassAssignments>,
}

impl StudentAssignments {
    #[must_use]
    pub const fn new(student_id: i64) -> Self {
        Self {
            student_id,
            classes: Vec::new(),
        }
    }

    /// Insert a class, replacing an earlier entry for the same class in place.
    pub fn insert_class(&mut self, class_id: i64, assignments: Vec<Assignment>) {
        if let Some(existing) = self.classes.iter_mut().find(|c| c.class_id == class_id) {
            existing.assignments = assignments;
        } else {
            self.classes.push(ClassAssignments {
                class_id,
                assignments,
            });
        }
    }

    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.classes.iter().map(|c| c.assignments.len()).sum()
    }
}

impl Serialize for StudentAssignments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len()))?;
        for class in &self.classes {
            map.serialize_entry(&class_key(class.class_id), &class.assignments)?;
        }
        map.end()
    }
}

/// `Student_<id>` → `Class_<id>` → assignments, in insertion order.
///
/// Built incrementally by the harvester and returned whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestResult {
    students: Vec<StudentAssignments>,
}

impl HarvestResult {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            students: Vec::new(),
        }
    }

    /// Insert a student entry, replacing an earlier entry for the same id in place.
    pub fn insert_student(&mut self, entry: StudentAssignments) {
        if let Some(existing) = self
            .students
            .iter_mut()
            .find(|s| s.student_id == entry.student_id)
        {
            *existing = entry;
        } else {
            self.students.push(entry);
        }
    }

    #[must_use]
    pub fn student(&self, student_id: i64) -> Option<&StudentAssignments> {
        self.students.iter().find(|s| s.student_id == student_id)
    }

    #[must_use]
    pub fn students(&self) -> &[StudentAssignments] {
        &self.students
    }

    #[must_use]
    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Sum of list lengths across every class of every student.
    #[must_use]
    pub fn total_assignments(&self) -> usize {
        self.students
            .iter()
            .map(StudentAssignments::assignment_count)
            .sum()
    }
}

impl Serialize for HarvestResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.students.len()))?;
        for student in &self.students {
            map.serialize_entry(&student_key(student.student_id), student)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enrollment(class_id: i64, state: &str) -> Enrollment {
        Enrollment::from_row(json!({"classId": class_id, "state": state})).unwrap()
    }

    fn assignment(raw: Value) -> Assignment {
        Assignment::from_row(raw).unwrap()
    }

    #[test]
    fn enrollment_state_parses_wire_values() {
        assert_eq!(
            EnrollmentState::from("ENROLLED".to_string()),
            EnrollmentState::Enrolled
        );
        assert_eq!(
            EnrollmentState::from("CANCELLED".to_string()),
            EnrollmentState::Other("CANCELLED".to_string())
        );
        // state comparison is exact
        assert!(!EnrollmentState::from("enrolled".to_string()).is_enrolled());
    }

    #[test]
    fn enrolled_class_ids_keeps_order_and_duplicates() {
        let enrollments = vec![
            enrollment(3, "ENROLLED"),
            enrollment(1, "CANCELLED"),
            enrollment(2, "ENROLLED"),
            enrollment(3, "ENROLLED"),
            enrollment(4, "TRANSFERRED"),
        ];
        assert_eq!(enrolled_class_ids(&enrollments), vec![3, 2, 3]);
    }

    #[test]
    fn enrollment_reads_string_class_ids_and_ignores_other_fields() {
        let row = json!({
            "id": "e-1",
            "studentId": "not-a-number",
            "classId": "5",
            "state": "ENROLLED",
            "dateEnrolled": 1_700_000_000
        });
        let enrollment = Enrollment::from_row(row).unwrap();
        assert_eq!(enrollment.class_id(), Some(5));
        assert!(enrollment.is_enrolled());
        assert_eq!(enrollment.fields()["id"], "e-1");
    }

    #[test]
    fn enrollment_without_usable_class_id_is_not_harvested() {
        let rows = vec![
            Enrollment::from_row(json!({"classId": "abc", "state": "ENROLLED"})).unwrap(),
            Enrollment::from_row(json!({"state": "ENROLLED"})).unwrap(),
            Enrollment::from_row(json!({"classId": 9, "state": 1})).unwrap(),
            enrollment(7, "ENROLLED"),
        ];
        assert!(!rows[2].is_enrolled());
        assert_eq!(enrolled_class_ids(&rows), vec![7]);
    }

    #[test]
    fn non_object_rows_are_rejected() {
        assert!(Enrollment::from_row(json!(5)).is_none());
        assert!(Assignment::from_row(json!("row")).is_none());
        assert!(Assignment::from_row(Value::Null).is_none());
    }

    #[test]
    fn assignment_accessors_tolerate_unexpected_types() {
        let a = assignment(json!({"id": "11", "score": "N/A", "letterGrade": null}));
        assert_eq!(a.id(), Some(&json!("11")));
        assert_eq!(a.score(), None);
        assert_eq!(a.letter_grade(), None);
        assert_eq!(a.context(), None);

        let b = assignment(json!({
            "id": 10,
            "score": 92.5,
            "letterGrade": "A",
            "context": {"classId": "1", "lessonNumber": 4, "title": "Fractions"}
        }));
        assert_eq!(b.score(), Some(92.5));
        assert_eq!(b.letter_grade(), Some("A"));
        let ctx = b.context().unwrap();
        assert_eq!(ctx.class_id, Some(1));
        assert_eq!(ctx.lesson_number, Some(4));
        assert_eq!(ctx.title.as_deref(), Some("Fractions"));
        assert_eq!(ctx.lesson_topic, None);
    }

    #[test]
    fn assignment_serializes_fields_in_received_order() {
        let text = r#"{"score":90,"__typename":"StudentAssignment","context":{"title":"Fractions","classId":1},"id":10,"hwAttachmentsState":"NONE","letterGrade":"A"}"#;
        let a = assignment(serde_json::from_str(text).unwrap());
        assert_eq!(serde_json::to_string(&a).unwrap(), text);
    }

    #[test]
    fn harvest_result_serializes_with_prefixed_keys_in_order() {
        let mut result = HarvestResult::new();
        let mut second = StudentAssignments::new(20);
        second.insert_class(
            7,
            vec![assignment(json!({"id": 1, "score": 50}))],
        );
        result.insert_student(second);
        result.insert_student(StudentAssignments::new(10));

        let text = serde_json::to_string(&result).unwrap();
        assert_eq!(
            text,
            r#"{"Student_20":{"Class_7":[{"id":1,"score":50}]},"Student_10":{}}"#
        );
        assert_eq!(result.student_count(), 2);
        assert_eq!(result.total_assignments(), 1);
    }

    #[test]
    fn duplicate_class_replaces_in_place() {
        let a = assignment(json!({"id": 1}));
        let b = assignment(json!({"id": "2"}));
        let mut student = StudentAssignments::new(1);
        student.insert_class(5, vec![a.clone(), a]);
        student.insert_class(6, vec![b.clone()]);
        student.insert_class(5, vec![b]);
        assert_eq!(student.classes.len(), 2);
        assert_eq!(student.classes[0].class_id, 5);
        assert_eq!(student.assignment_count(), 2);
    }

    #[test]
    fn credential_debug_redacts_secret() {
        let cred = Credential::new("parent@example.com", "hunter2");
        let debug = format!("{cred:?}");
        assert!(debug.contains("parent@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
