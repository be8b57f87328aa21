// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{GitOpsError, Result};

/// Where a manifest lives: repository plus the tenant/cluster-scoped
/// path inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestTarget {
	pub repo_url: String,
	pub tenant_id: String,
	pub cluster_id: Option<String>,
	pub resource_type: String,
	pub resource_name: String,
}

impl ManifestTarget {
	/// Repo-relative manifest path. Cluster-aware targets scope by
	/// cluster between tenant and resource type.
	pub fn relative_path(&self) -> String {
		match &self.cluster_id {
			Some(cluster) => format!(
				"tenants/{}/{}/{}/{}/manifest.yaml",
				self.tenant_id, cluster, self.resource_type, self.resource_name
			),
			None => format!(
				"tenants/{}/{}/{}/manifest.yaml",
				self.tenant_id, self.resource_type, self.resource_name
			),
		}
	}

	/// Local directory name for the target repository, derived from the
	/// URL the way a clone would name it.
	pub fn repo_name(&self) -> String {
		self.repo_url
			.rsplit('/')
			.next()
			.unwrap_or(&self.repo_url)
			.trim_end_matches(".git")
			.to_string()
	}

	pub fn deploy_message(&self) -> String {
		let mut message = format!(
			"Deploy {} {} for tenant {}",
			self.resource_type, self.resource_name, self.tenant_id
		);
		if let Some(cluster) = &self.cluster_id {
			message.push_str(&format!(" in cluster {cluster}"));
		}
		message
	}

	pub fn delete_message(&self) -> String {
		let mut message = format!(
			"Delete {} {} for tenant {}",
			self.resource_type, self.resource_name, self.tenant_id
		);
		if let Some(cluster) = &self.cluster_id {
			message.push_str(&format!(" in cluster {cluster}"));
		}
		message
	}

	/// Reject path components that would escape the repository root.
	pub fn validate(&self) -> Result<()> {
		for (label, value) in [
			("tenant id", self.tenant_id.as_str()),
			("resource type", self.resource_type.as_str()),
			("resource name", self.resource_name.as_str()),
		] {
			validate_component(label, value)?;
		}
		if let Some(cluster) = &self.cluster_id {
			validate_component("cluster id", cluster)?;
		}
		Ok(())
	}
}

fn validate_component(label: &str, value: &str) -> Result<()> {
	if value.is_empty() {
		return Err(GitOpsError::InvalidTarget(format!("{label} is empty")));
	}
	if value == "." || value == ".." || value.contains('/') || value.contains('\\') {
		return Err(GitOpsError::InvalidTarget(format!(
			"{label} contains path separators: {value}"
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn target(cluster: Option<&str>) -> ManifestTarget {
		ManifestTarget {
			repo_url: "https://git.example.com/org/infra-gitops.git".to_string(),
			tenant_id: "t1".to_string(),
			cluster_id: cluster.map(str::to_string),
			resource_type: "namespace".to_string(),
			resource_name: "team-a".to_string(),
		}
	}

	#[test]
	fn test_cluster_aware_path() {
		assert_eq!(
			target(Some("c1")).relative_path(),
			"tenants/t1/c1/namespace/team-a/manifest.yaml"
		);
	}

	#[test]
	fn test_cluster_free_path() {
		assert_eq!(
			target(None).relative_path(),
			"tenants/t1/namespace/team-a/manifest.yaml"
		);
	}

	#[test]
	fn test_repo_name_strips_git_suffix() {
		assert_eq!(target(None).repo_name(), "infra-gitops");
	}

	#[test]
	fn test_commit_messages_mention_cluster() {
		assert_eq!(
			target(Some("c1")).deploy_message(),
			"Deploy namespace team-a for tenant t1 in cluster c1"
		);
		assert_eq!(
			target(None).delete_message(),
			"Delete namespace team-a for tenant t1"
		);
	}

	#[test]
	fn test_path_escape_rejected() {
		let mut bad = target(None);
		bad.resource_name = "../../etc".to_string();
		assert!(bad.validate().is_err());

		let mut empty = target(None);
		empty.tenant_id = String::new();
		assert!(empty.validate().is_err());

		assert!(target(Some("c1")).validate().is_ok());
	}
}
