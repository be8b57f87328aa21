// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::committer::{CommitOutcome, RepositoryCommitter};
use crate::error::{GitOpsError, Result};
use crate::target::ManifestTarget;

const HEAD_FILE: &str = ".strata-head";

/// Commits manifests into per-repository worktrees on local disk.
///
/// Each repository gets a directory under the worktree root named
/// after the repo URL's last segment. Commits against the same
/// repository are serialized with a per-repo lock so concurrent jobs
/// cannot interleave a write and its head update.
pub struct WorktreeCommitter {
	root: PathBuf,
	locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WorktreeCommitter {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into(), locks: Mutex::new(HashMap::new()) }
	}

	async fn repo_lock(&self, repo: &str) -> Arc<Mutex<()>> {
		let mut locks = self.locks.lock().await;
		locks.entry(repo.to_string()).or_default().clone()
	}

	fn repo_dir(&self, target: &ManifestTarget) -> PathBuf {
		self.root.join(target.repo_name())
	}

	async fn read_head(repo_dir: &Path) -> String {
		match tokio::fs::read_to_string(repo_dir.join(HEAD_FILE)).await {
			Ok(head) => head.trim().to_string(),
			Err(_) => String::new(),
		}
	}

	async fn advance_head(repo_dir: &Path, parent: &str, path: &str, content: &str) -> Result<String> {
		let mut hasher = Sha256::new();
		hasher.update(parent.as_bytes());
		hasher.update(path.as_bytes());
		hasher.update(content.as_bytes());
		let commit_id = hex::encode(hasher.finalize())[..40].to_string();
		tokio::fs::write(repo_dir.join(HEAD_FILE), &commit_id).await?;
		Ok(commit_id)
	}

	/// Remove directories left empty by a manifest deletion, walking up
	/// to (but never past) the repository root.
	async fn prune_empty_dirs(repo_dir: &Path, mut dir: PathBuf) {
		while dir.starts_with(repo_dir) && dir != repo_dir {
			match tokio::fs::remove_dir(&dir).await {
				Ok(()) => {}
				Err(_) => break,
			}
			match dir.parent() {
				Some(parent) => dir = parent.to_path_buf(),
				None => break,
			}
		}
	}
}

#[async_trait]
impl RepositoryCommitter for WorktreeCommitter {
	#[tracing::instrument(skip(self, manifest), fields(repo = %target.repo_name(), path = %target.relative_path()))]
	async fn commit_manifest(&self, target: &ManifestTarget, manifest: &str) -> Result<CommitOutcome> {
		target.validate()?;
		let lock = self.repo_lock(&target.repo_name()).await;
		let _guard = lock.lock().await;

		let repo_dir = self.repo_dir(target);
		let rel_path = target.relative_path();
		let manifest_path = repo_dir.join(&rel_path);
		if let Some(parent) = manifest_path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		tokio::fs::write(&manifest_path, manifest).await?;

		let parent = Self::read_head(&repo_dir).await;
		let commit_id = Self::advance_head(&repo_dir, &parent, &rel_path, manifest).await?;
		let message = target.deploy_message();
		tracing::info!(commit_id = %commit_id, "committed manifest");

		Ok(CommitOutcome { commit_id, path: rel_path, message })
	}

	#[tracing::instrument(skip(self), fields(repo = %target.repo_name(), path = %target.relative_path()))]
	async fn delete_manifest(&self, target: &ManifestTarget) -> Result<CommitOutcome> {
		target.validate()?;
		let lock = self.repo_lock(&target.repo_name()).await;
		let _guard = lock.lock().await;

		let repo_dir = self.repo_dir(target);
		let rel_path = target.relative_path();
		let manifest_path = repo_dir.join(&rel_path);
		if tokio::fs::metadata(&manifest_path).await.is_err() {
			return Err(GitOpsError::ManifestNotFound(rel_path));
		}
		tokio::fs::remove_file(&manifest_path).await?;
		if let Some(parent) = manifest_path.parent() {
			Self::prune_empty_dirs(&repo_dir, parent.to_path_buf()).await;
		}

		let parent = Self::read_head(&repo_dir).await;
		let commit_id = Self::advance_head(&repo_dir, &parent, &rel_path, "").await?;
		let message = target.delete_message();
		tracing::info!(commit_id = %commit_id, "committed manifest deletion");

		Ok(CommitOutcome { commit_id, path: rel_path, message })
	}
}
