// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job persistence for the Strata server.
//!
//! This crate provides the `JobStore` abstraction with two interchangeable
//! backings: an in-memory map for development and a SQLite store for
//! durable deployments. Everything above this crate is backing-agnostic.

pub mod error;
pub mod memory;
pub mod pool;
pub mod sqlite;
pub mod store;
pub mod testing;
pub mod types;

pub use error::{DbError, Result};
pub use memory::MemoryJobStore;
pub use pool::{create_pool, run_migrations};
pub use sqlite::SqliteJobStore;
pub use store::JobStore;
pub use types::{Job, JobFilter, JobStatus, LogEntry, Operation};
