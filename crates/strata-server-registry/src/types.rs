// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Open flavor sentinel. Always accepted regardless of the configured
/// flavor set; rendering falls back to the generic full-spec template.
pub const FLAVOR_CUSTOM: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMode {
	/// One notification after the job reaches a terminal outcome.
	Single,
	/// One notification per completed pipeline stage, plus the final one.
	Staged,
}

impl WebhookMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			WebhookMode::Single => "single",
			WebhookMode::Staged => "staged",
		}
	}
}

impl std::str::FromStr for WebhookMode {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"single" => Ok(WebhookMode::Single),
			"staged" => Ok(WebhookMode::Staged),
			_ => Err(format!("unknown webhook mode: {s}")),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPolicy {
	pub enabled: bool,
	pub url: String,
	pub mode: WebhookMode,
	/// When true a failed delivery fails the job; otherwise delivery is
	/// best-effort and the job completes with degraded notification.
	#[serde(default)]
	pub mandatory: bool,
	#[serde(default = "default_webhook_timeout_secs")]
	pub timeout_secs: u64,
	#[serde(default = "default_webhook_retries")]
	pub max_retries: u32,
	/// HMAC-SHA256 signing secret for outbound payloads.
	#[serde(default)]
	pub secret: Option<String>,
}

fn default_webhook_timeout_secs() -> u64 {
	30
}

fn default_webhook_retries() -> u32 {
	3
}

impl Default for WebhookPolicy {
	fn default() -> Self {
		Self {
			enabled: false,
			url: String::new(),
			mode: WebhookMode::Single,
			mandatory: false,
			timeout_secs: default_webhook_timeout_secs(),
			max_retries: default_webhook_retries(),
			secret: None,
		}
	}
}

/// Per-resource-type configuration. Immutable once registered; replacing
/// an entry is a registry-level operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTypeConfig {
	/// Filled from the table key when loaded from configuration.
	#[serde(default)]
	pub name: String,
	pub repo_url: String,
	pub template_dir: String,
	#[serde(default = "default_true")]
	pub cluster_aware: bool,
	pub flavors: Vec<String>,
	#[serde(default)]
	pub webhook: WebhookPolicy,
}

fn default_true() -> bool {
	true
}

impl ResourceTypeConfig {
	pub fn is_valid_flavor(&self, flavor: &str) -> bool {
		flavor == FLAVOR_CUSTOM || self.flavors.iter().any(|f| f == flavor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn namespace_config() -> ResourceTypeConfig {
		ResourceTypeConfig {
			name: "namespace".to_string(),
			repo_url: "https://git.example.com/infra-gitops.git".to_string(),
			template_dir: "namespaces".to_string(),
			cluster_aware: true,
			flavors: vec![
				"small".to_string(),
				"medium".to_string(),
				"large".to_string(),
			],
			webhook: WebhookPolicy::default(),
		}
	}

	#[test]
	fn test_configured_flavor_accepted() {
		let config = namespace_config();
		assert!(config.is_valid_flavor("small"));
		assert!(config.is_valid_flavor("large"));
	}

	#[test]
	fn test_custom_always_accepted() {
		let config = namespace_config();
		assert!(config.is_valid_flavor(FLAVOR_CUSTOM));
	}

	#[test]
	fn test_unknown_flavor_rejected() {
		let config = namespace_config();
		assert!(!config.is_valid_flavor("huge"));
	}

	#[test]
	fn test_webhook_mode_round_trip() {
		assert_eq!("single".parse::<WebhookMode>().unwrap(), WebhookMode::Single);
		assert_eq!("staged".parse::<WebhookMode>().unwrap(), WebhookMode::Staged);
		assert!("both".parse::<WebhookMode>().is_err());
	}
}
