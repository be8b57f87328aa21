// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum GitOpsError {
	#[error("Manifest not found: {0}")]
	ManifestNotFound(String),

	#[error("Commit conflict: {0}")]
	CommitConflict(String),

	#[error("Invalid manifest target: {0}")]
	InvalidTarget(String),

	#[error("Repository I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl GitOpsError {
	/// Conflicts and I/O hiccups are worth retrying; a missing manifest
	/// or malformed target is not.
	pub fn is_transient(&self) -> bool {
		matches!(self, GitOpsError::CommitConflict(_) | GitOpsError::Io(_))
	}
}

pub type Result<T> = std::result::Result<T, GitOpsError>;
