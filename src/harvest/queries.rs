//! GraphQL documents sent to the portal.

use serde::Serialize;

pub const ENROLLMENTS_OPERATION: &str = "GetStudentEnrollments";
pub const ENROLLMENTS_FIELD: &str = "studentEnrollments";

pub const ENROLLMENTS_QUERY: &str = r"query GetStudentEnrollments($studentId: Long!, $academicEndYear: Int) {
  studentEnrollments(studentId: $studentId, academicEndYear: $academicEndYear) {
    id
    registrationId
    dateEnrolled
    dateCancelled
    state
    classId
    transferClassId
    semesterId
    stateChangedOn
    studentId
    __typename
  }
}";

pub const ASSIGNMENTS_OPERATION: &str = "GetStudentAssignments";
pub const ASSIGNMENTS_FIELD: &str = "assignmentsForStudent";

pub const ASSIGNMENTS_QUERY: &str = r"query GetStudentAssignments($studentId: Long!, $classId: Long!, $types: [SectionTypeEnum]) {
  assignmentsForStudent(classId: $classId, studentId: $studentId, types: $types) {
    assignmentItemCount
    id
    createdOn
    context {
      classId
      lessonNumber
      lessonTopic
      title
      __typename
    }
    letterGrade
    score
    bonusScore
    hwAttachmentsState
    __typename
  }
}";

/// Request body accepted by the GraphQL endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest<V> {
    pub operation_name: &'static str,
    pub variables: V,
    pub query: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentVariables {
    pub student_id: i64,
    pub academic_end_year: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentVariables<'a> {
    pub student_id: i64,
    pub class_id: i64,
    pub types: &'a [String],
}

#[must_use]
pub const fn enrollments(student_id: i64, academic_end_year: i32) -> GraphQlRequest<EnrollmentVariables> {
    GraphQlRequest {
        operation_name: ENROLLMENTS_OPERATION,
        variables: EnrollmentVariables {
            student_id,
            academic_end_year,
        },
        query: ENROLLMENTS_QUERY,
    }
}

#[must_use]
pub const fn assignments(
    student_id: i64,
    class_id: i64,
    types: &[String],
) -> GraphQlRequest<AssignmentVariables<'_>> {
    GraphQlRequest {
        operation_name: ASSIGNMENTS_OPERATION,
        variables: AssignmentVariables {
            student_id,
            class_id,
            types,
        },
        query: ASSIGNMENTS_QUERY,
    }
}
