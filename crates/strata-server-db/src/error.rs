// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Job not found: {0}")]
	NotFound(String),

	/// The job exists but belongs to another tenant.
	#[error("Access denied")]
	Forbidden,

	/// A write lost a race, most often a status update that would move
	/// the job backwards through its lifecycle.
	#[error("Conflicting update: {0}")]
	Conflict(String),

	#[error("Store error: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
