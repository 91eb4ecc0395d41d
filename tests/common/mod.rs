//! Common helpers for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: wiremock portal and GraphQL mocks
//! - `log_capture`: tracing capture for asserting on emitted events
//! - `logger`: structured per-test logging

pub mod fixtures;
pub mod log_capture;
pub mod logger;
