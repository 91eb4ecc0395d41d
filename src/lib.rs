//! rsm-monitor - RSM parent-portal monitor
//!
//! Logs into the RSM parent portal, captures the session bearer token, and
//! harvests homework assignments for each enrolled class of each student.
//! Runs as an AWS Lambda function or as a local CLI.

#![forbid(unsafe_code)]
#![recursion_limit = "256"]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cli;
pub mod core;
pub mod error;
pub mod handler;
pub mod harvest;
pub mod secrets;
pub mod storage;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExitCode, Result, RsmError};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
