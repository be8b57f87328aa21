// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository commit plumbing for the Strata server.
//!
//! The `RepositoryCommitter` trait is the seam to the Git hosting world:
//! write manifest bytes to a tenant/cluster-scoped path in a resource
//! type's repository and produce a commit identifier. The in-tree
//! `WorktreeCommitter` maintains local worktrees with per-repository
//! write serialization; clone/push/credential mechanics live outside
//! this crate.

pub mod committer;
pub mod error;
pub mod target;
pub mod worktree;

pub use committer::{CommitOutcome, RepositoryCommitter};
pub use error::{GitOpsError, Result};
pub use target::ManifestTarget;
pub use worktree::WorktreeCommitter;
