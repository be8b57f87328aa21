// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{RegistryError, Result};
use crate::handler::{builtin_handler, ResourceHandler};
use crate::types::{ResourceTypeConfig, WebhookMode, WebhookPolicy};

/// A registered resource type: immutable config plus its capability
/// handler.
#[derive(Clone)]
pub struct RegisteredType {
	pub config: ResourceTypeConfig,
	pub handler: Arc<dyn ResourceHandler>,
}

impl std::fmt::Debug for RegisteredType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegisteredType")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

/// Read-mostly registry of resource types. Lookups clone an `Arc`'d
/// entry under a read lock; registration takes the write lock briefly,
/// so readers never observe a partially-applied update.
pub struct ResourceTypeRegistry {
	types: RwLock<HashMap<String, Arc<RegisteredType>>>,
}

impl ResourceTypeRegistry {
	pub fn new() -> Self {
		Self {
			types: RwLock::new(HashMap::new()),
		}
	}

	/// Registry pre-loaded with the default resource types.
	pub fn with_defaults() -> Self {
		let registry = Self::new();
		for config in default_configs() {
			registry
				.register(config)
				.expect("default configs are disjoint and valid");
		}
		registry
	}

	#[tracing::instrument(skip(self, config), fields(resource_type = %config.name))]
	pub fn register(&self, config: ResourceTypeConfig) -> Result<()> {
		let handler = builtin_handler(&config.name);
		self.register_with_handler(config, handler)
	}

	pub fn register_with_handler(
		&self,
		config: ResourceTypeConfig,
		handler: Arc<dyn ResourceHandler>,
	) -> Result<()> {
		validate_config(&config)?;

		let mut types = self.types.write().expect("registry lock poisoned");
		if types.contains_key(&config.name) {
			return Err(RegistryError::DuplicateResourceType(config.name));
		}
		let name = config.name.clone();
		types.insert(name.clone(), Arc::new(RegisteredType { config, handler }));
		tracing::info!(resource_type = %name, "resource type registered");
		Ok(())
	}

	/// Swap an existing entry wholesale. In-flight jobs keep the `Arc`
	/// they resolved at submission time.
	#[tracing::instrument(skip(self, config), fields(resource_type = %config.name))]
	pub fn replace(&self, config: ResourceTypeConfig) -> Result<()> {
		validate_config(&config)?;

		let handler = builtin_handler(&config.name);
		let mut types = self.types.write().expect("registry lock poisoned");
		if !types.contains_key(&config.name) {
			return Err(RegistryError::UnknownResourceType(config.name));
		}
		types.insert(
			config.name.clone(),
			Arc::new(RegisteredType { config, handler }),
		);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Result<Arc<RegisteredType>> {
		let types = self.types.read().expect("registry lock poisoned");
		types
			.get(name)
			.cloned()
			.ok_or_else(|| RegistryError::UnknownResourceType(name.to_string()))
	}

	pub fn list(&self) -> Vec<String> {
		let types = self.types.read().expect("registry lock poisoned");
		let mut names: Vec<String> = types.keys().cloned().collect();
		names.sort();
		names
	}
}

impl Default for ResourceTypeRegistry {
	fn default() -> Self {
		Self::new()
	}
}

fn validate_config(config: &ResourceTypeConfig) -> Result<()> {
	if config.name.is_empty() {
		return Err(RegistryError::InvalidConfig(
			"resource type name must not be empty".to_string(),
		));
	}
	if config.flavors.is_empty() {
		return Err(RegistryError::InvalidConfig(format!(
			"resource type {} must configure at least one flavor",
			config.name
		)));
	}
	if config.webhook.enabled && config.webhook.url.is_empty() {
		return Err(RegistryError::InvalidConfig(format!(
			"resource type {} enables webhooks without a url",
			config.name
		)));
	}
	Ok(())
}

/// The stock resource types shipped with the server. TOML configuration
/// may add to or replace these at startup.
pub fn default_configs() -> Vec<ResourceTypeConfig> {
	vec![
		ResourceTypeConfig {
			name: "namespace".to_string(),
			repo_url: "https://git.example.com/org/infra-gitops.git".to_string(),
			template_dir: "namespaces".to_string(),
			cluster_aware: true,
			flavors: vec![
				"small".to_string(),
				"medium".to_string(),
				"large".to_string(),
				"custom".to_string(),
			],
			webhook: WebhookPolicy::default(),
		},
		ResourceTypeConfig {
			name: "vm".to_string(),
			repo_url: "https://git.example.com/org/vm-resources-gitops.git".to_string(),
			template_dir: "vms".to_string(),
			cluster_aware: false,
			flavors: vec![
				"small".to_string(),
				"medium".to_string(),
				"large".to_string(),
				"custom".to_string(),
			],
			webhook: WebhookPolicy {
				enabled: true,
				url: "https://webhook.example.com/vm".to_string(),
				mode: WebhookMode::Single,
				..Default::default()
			},
		},
		ResourceTypeConfig {
			name: "osimage".to_string(),
			repo_url: "https://git.example.com/org/os-image-builds-gitops.git".to_string(),
			template_dir: "osimage".to_string(),
			cluster_aware: false,
			flavors: vec![
				"ubuntu-small".to_string(),
				"rhel-custom".to_string(),
				"custom".to_string(),
			],
			webhook: WebhookPolicy {
				enabled: true,
				url: "https://webhook.example.com/osimage".to_string(),
				mode: WebhookMode::Staged,
				..Default::default()
			},
		},
		ResourceTypeConfig {
			name: "misc".to_string(),
			repo_url: "https://git.example.com/org/misc-infra-gitops.git".to_string(),
			template_dir: "misc".to_string(),
			cluster_aware: true,
			flavors: vec![
				"dns-record".to_string(),
				"certificate".to_string(),
				"secret".to_string(),
				"custom".to_string(),
			],
			webhook: WebhookPolicy {
				enabled: true,
				url: "https://webhook.example.com/misc".to_string(),
				mode: WebhookMode::Single,
				..Default::default()
			},
		},
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	fn minimal_config(name: &str) -> ResourceTypeConfig {
		ResourceTypeConfig {
			name: name.to_string(),
			repo_url: "https://git.example.com/test.git".to_string(),
			template_dir: name.to_string(),
			cluster_aware: false,
			flavors: vec!["small".to_string()],
			webhook: WebhookPolicy::default(),
		}
	}

	#[test]
	fn test_register_and_get() {
		let registry = ResourceTypeRegistry::new();
		registry.register(minimal_config("database")).unwrap();

		let entry = registry.get("database").unwrap();
		assert_eq!(entry.config.name, "database");
	}

	#[test]
	fn test_duplicate_registration_rejected() {
		let registry = ResourceTypeRegistry::new();
		registry.register(minimal_config("database")).unwrap();

		match registry.register(minimal_config("database")) {
			Err(RegistryError::DuplicateResourceType(name)) => assert_eq!(name, "database"),
			other => panic!("expected DuplicateResourceType, got {other:?}"),
		}
	}

	#[test]
	fn test_unknown_lookup() {
		let registry = ResourceTypeRegistry::new();
		match registry.get("nope") {
			Err(RegistryError::UnknownResourceType(name)) => assert_eq!(name, "nope"),
			other => panic!("expected UnknownResourceType, got {other:?}"),
		}
	}

	#[test]
	fn test_empty_flavor_set_rejected() {
		let registry = ResourceTypeRegistry::new();
		let mut config = minimal_config("database");
		config.flavors.clear();
		assert!(matches!(
			registry.register(config),
			Err(RegistryError::InvalidConfig(_))
		));
	}

	#[test]
	fn test_replace_requires_existing() {
		let registry = ResourceTypeRegistry::new();
		assert!(matches!(
			registry.replace(minimal_config("database")),
			Err(RegistryError::UnknownResourceType(_))
		));

		registry.register(minimal_config("database")).unwrap();
		let mut updated = minimal_config("database");
		updated.flavors.push("large".to_string());
		registry.replace(updated).unwrap();
		assert!(registry.get("database").unwrap().config.is_valid_flavor("large"));
	}

	#[test]
	fn test_defaults_cover_stock_types() {
		let registry = ResourceTypeRegistry::with_defaults();
		assert_eq!(registry.list(), vec!["misc", "namespace", "osimage", "vm"]);
		assert!(registry.get("namespace").unwrap().config.cluster_aware);
		assert!(!registry.get("vm").unwrap().config.cluster_aware);
		assert_eq!(
			registry.get("osimage").unwrap().config.webhook.mode,
			WebhookMode::Staged
		);
	}

	#[test]
	fn test_concurrent_reads_during_registration() {
		use std::sync::Arc as StdArc;

		let registry = StdArc::new(ResourceTypeRegistry::with_defaults());
		let mut handles = Vec::new();

		for i in 0..4 {
			let registry = StdArc::clone(&registry);
			handles.push(std::thread::spawn(move || {
				for _ in 0..200 {
					let entry = registry.get("namespace").unwrap();
					assert_eq!(entry.config.name, "namespace");
					let _ = registry.list();
				}
				let _ = registry.register(minimal_config(&format!("type-{i}")));
			}));
		}

		for handle in handles {
			handle.join().unwrap();
		}
		assert!(registry.list().len() >= 5);
	}
}
