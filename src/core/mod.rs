//! Core data models and shared infrastructure.

pub mod chromedriver;
pub mod http;
pub mod logging;
pub mod models;
pub mod token;
pub mod wait;

pub use models::{
    Assignment, ClassAssignments, Credential, Enrollment, EnrollmentState, HarvestResult,
    LessonContext, StudentAssignments, class_key, enrolled_class_ids, student_key,
};
pub use token::BearerToken;
