// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Worktree and template locations.

use std::path::PathBuf;

use serde::Deserialize;

/// GitOps configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct GitOpsConfig {
	/// Root directory holding one worktree per manifest repository.
	pub worktree_root: PathBuf,
	/// Root directory for manifest templates.
	pub templates_dir: PathBuf,
}

impl Default for GitOpsConfig {
	fn default() -> Self {
		Self {
			worktree_root: PathBuf::from("./worktrees"),
			templates_dir: PathBuf::from("./templates"),
		}
	}
}

/// GitOps configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitOpsConfigLayer {
	#[serde(default)]
	pub worktree_root: Option<PathBuf>,
	#[serde(default)]
	pub templates_dir: Option<PathBuf>,
}

impl GitOpsConfigLayer {
	pub fn merge(&mut self, other: GitOpsConfigLayer) {
		if other.worktree_root.is_some() {
			self.worktree_root = other.worktree_root;
		}
		if other.templates_dir.is_some() {
			self.templates_dir = other.templates_dir;
		}
	}

	pub fn finalize(self) -> GitOpsConfig {
		let defaults = GitOpsConfig::default();
		GitOpsConfig {
			worktree_root: self.worktree_root.unwrap_or(defaults.worktree_root),
			templates_dir: self.templates_dir.unwrap_or(defaults.templates_dir),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = GitOpsConfigLayer::default().finalize();
		assert_eq!(config.worktree_root, PathBuf::from("./worktrees"));
		assert_eq!(config.templates_dir, PathBuf::from("./templates"));
	}
}
