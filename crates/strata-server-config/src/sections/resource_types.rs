// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource type tables.
//!
//! `[resource_types.<name>]` tables in the config file add to or replace
//! the stock types; their `name` field is filled from the table key.

use std::collections::HashMap;

use strata_server_registry::{default_configs, ResourceTypeConfig};

/// Raw `[resource_types.*]` tables keyed by type name.
pub type ResourceTypesLayer = HashMap<String, ResourceTypeConfig>;

/// Overlay the configured tables onto the stock resource types.
pub fn finalize_resource_types(layer: Option<ResourceTypesLayer>) -> Vec<ResourceTypeConfig> {
	let mut by_name: std::collections::BTreeMap<String, ResourceTypeConfig> = default_configs()
		.into_iter()
		.map(|config| (config.name.clone(), config))
		.collect();

	if let Some(layer) = layer {
		for (name, mut config) in layer {
			config.name = name.clone();
			by_name.insert(name, config);
		}
	}

	by_name.into_values().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stock_types_present_by_default() {
		let types = finalize_resource_types(None);
		let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
		assert!(names.contains(&"namespace"));
		assert!(names.contains(&"vm"));
		assert!(names.contains(&"osimage"));
		assert!(names.contains(&"misc"));
	}

	#[test]
	fn test_configured_table_replaces_stock_type() {
		let mut layer = ResourceTypesLayer::new();
		layer.insert(
			"vm".to_string(),
			ResourceTypeConfig {
				name: String::new(),
				repo_url: "https://git.example.com/other/vms.git".to_string(),
				template_dir: "vms".to_string(),
				cluster_aware: false,
				flavors: vec!["custom".to_string()],
				webhook: Default::default(),
			},
		);
		let types = finalize_resource_types(Some(layer));
		let vm = types.iter().find(|t| t.name == "vm").unwrap();
		assert_eq!(vm.repo_url, "https://git.example.com/other/vms.git");
	}
}
