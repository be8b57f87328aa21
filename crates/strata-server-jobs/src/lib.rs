// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job engine for resource lifecycle requests.
//!
//! Turns validated lifecycle requests into tracked jobs, executes the
//! render, commit, and notify pipeline for each, serializes jobs that
//! touch the same resource, and retries transient failures with
//! exponential backoff.

pub mod config;
pub mod engine;
pub mod error;
mod pipeline;

pub use config::EngineConfig;
pub use engine::{JobEngine, SubmitRequest};
pub use error::{JobsError, Result};
