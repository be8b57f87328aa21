// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::Result;
use crate::target::ManifestTarget;

/// Result of a commit against the manifest repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
	pub commit_id: String,
	pub path: String,
	pub message: String,
}

/// Writes rendered manifests into a GitOps repository.
///
/// Commits against the same repository are serialized by the
/// implementation; callers may invoke this concurrently for
/// different resources.
#[async_trait]
pub trait RepositoryCommitter: Send + Sync {
	/// Write (or overwrite) the manifest for `target` and commit it.
	async fn commit_manifest(&self, target: &ManifestTarget, manifest: &str) -> Result<CommitOutcome>;

	/// Remove the manifest for `target` and commit the deletion.
	/// Fails with `ManifestNotFound` when nothing is tracked at the path.
	async fn delete_manifest(&self, target: &ManifestTarget) -> Result<CommitOutcome>;
}
