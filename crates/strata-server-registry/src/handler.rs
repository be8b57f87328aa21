// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Closed capability contract implemented by every resource type.
//!
//! New types are added by registering a new implementation, never by
//! runtime code generation.

use serde_json::{Map, Value};

use crate::error::{RegistryError, Result};

const VALID_INSTANCE_TYPES: &[&str] = &[
	"t3.micro", "t3.small", "t3.medium", "t3.large", "m5.large", "m5.xlarge", "c5.large",
	"c5.xlarge",
];

pub trait ResourceHandler: Send + Sync {
	/// Validate the request spec ahead of rendering. Failures are fatal
	/// for the job, never retried.
	fn validate_spec(&self, name: &str, spec: &Value) -> Result<()>;

	/// Build the template context: resource identity plus the spec
	/// fields, with any type-specific enrichment.
	fn template_context(
		&self,
		name: &str,
		tenant_id: &str,
		cluster_id: Option<&str>,
		spec: &Value,
	) -> Value {
		base_context(name, tenant_id, cluster_id, spec)
	}

	/// Manifest text committed as a removal marker on delete. `None`
	/// means the committer's delete path is used instead.
	fn delete_marker(&self, _name: &str, _tenant_id: &str) -> Option<String> {
		None
	}
}

fn base_context(name: &str, tenant_id: &str, cluster_id: Option<&str>, spec: &Value) -> Value {
	let mut context = Map::new();
	if let Value::Object(fields) = spec {
		for (key, value) in fields {
			context.insert(key.clone(), value.clone());
		}
	}
	context.insert("name".to_string(), Value::String(name.to_string()));
	context.insert("tenant_id".to_string(), Value::String(tenant_id.to_string()));
	if let Some(cluster) = cluster_id {
		context.insert("cluster_id".to_string(), Value::String(cluster.to_string()));
	}
	Value::Object(context)
}

fn require_object<'a>(spec: &'a Value) -> Result<&'a Map<String, Value>> {
	spec.as_object()
		.ok_or_else(|| RegistryError::InvalidSpec("spec must be an object".to_string()))
}

/// Kubernetes namespace resources.
pub struct NamespaceHandler;

impl ResourceHandler for NamespaceHandler {
	fn validate_spec(&self, name: &str, spec: &Value) -> Result<()> {
		let fields = require_object(spec)?;

		if name.is_empty() || name.len() > 63 {
			return Err(RegistryError::InvalidSpec(
				"namespace name must be 1-63 characters".to_string(),
			));
		}
		if !name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		{
			return Err(RegistryError::InvalidSpec(
				"namespace name must be alphanumeric with hyphens/underscores".to_string(),
			));
		}

		for key in ["labels", "annotations", "resource_quota"] {
			if let Some(value) = fields.get(key) {
				if !value.is_object() {
					return Err(RegistryError::InvalidSpec(format!("{key} must be a mapping")));
				}
			}
		}

		Ok(())
	}

	fn template_context(
		&self,
		name: &str,
		tenant_id: &str,
		cluster_id: Option<&str>,
		spec: &Value,
	) -> Value {
		let mut context = base_context(name, tenant_id, cluster_id, spec);

		// Tenant labels ride along on every namespace manifest.
		let labels = context
			.as_object_mut()
			.expect("base_context returns an object")
			.entry("labels")
			.or_insert_with(|| Value::Object(Map::new()));
		if let Value::Object(labels) = labels {
			labels.insert(
				"tenant.io/id".to_string(),
				Value::String(tenant_id.to_string()),
			);
			labels.insert(
				"managed-by".to_string(),
				Value::String("strata".to_string()),
			);
		}

		context
	}
}

/// Virtual machines provisioned through Crossplane manifests.
pub struct VmHandler;

impl ResourceHandler for VmHandler {
	fn validate_spec(&self, _name: &str, spec: &Value) -> Result<()> {
		let fields = require_object(spec)?;

		for required in ["instance_type", "image"] {
			if !fields.contains_key(required) {
				return Err(RegistryError::InvalidSpec(format!(
					"missing required field: {required}"
				)));
			}
		}

		let instance_type = fields
			.get("instance_type")
			.and_then(Value::as_str)
			.unwrap_or_default();
		if !VALID_INSTANCE_TYPES.contains(&instance_type) {
			return Err(RegistryError::InvalidSpec(format!(
				"invalid instance type: {instance_type}"
			)));
		}

		if let Some(disk) = fields.get("disk_size") {
			match disk.as_i64() {
				Some(size) if (8..=1000).contains(&size) => {}
				_ => {
					return Err(RegistryError::InvalidSpec(
						"disk_size must be between 8 and 1000 GB".to_string(),
					))
				}
			}
		}

		Ok(())
	}

	fn template_context(
		&self,
		name: &str,
		tenant_id: &str,
		cluster_id: Option<&str>,
		spec: &Value,
	) -> Value {
		let mut context = base_context(name, tenant_id, cluster_id, spec);

		let tags = context
			.as_object_mut()
			.expect("base_context returns an object")
			.entry("tags")
			.or_insert_with(|| Value::Object(Map::new()));
		if let Value::Object(tags) = tags {
			tags.insert("Tenant".to_string(), Value::String(tenant_id.to_string()));
			tags.insert("ManagedBy".to_string(), Value::String("strata".to_string()));
		}

		context
	}
}

/// Fallback for resource types without bespoke rules; only requires the
/// spec to be a structured document.
pub struct GenericHandler;

impl ResourceHandler for GenericHandler {
	fn validate_spec(&self, _name: &str, spec: &Value) -> Result<()> {
		require_object(spec)?;
		Ok(())
	}
}

/// Pick the built-in handler for a resource type name.
pub fn builtin_handler(resource_type: &str) -> std::sync::Arc<dyn ResourceHandler> {
	match resource_type {
		"namespace" => std::sync::Arc::new(NamespaceHandler),
		"vm" => std::sync::Arc::new(VmHandler),
		_ => std::sync::Arc::new(GenericHandler),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_namespace_accepts_simple_spec() {
		let handler = NamespaceHandler;
		assert!(handler
			.validate_spec("team-a", &json!({"labels": {"env": "dev"}}))
			.is_ok());
	}

	#[test]
	fn test_namespace_rejects_bad_name() {
		let handler = NamespaceHandler;
		assert!(handler.validate_spec("team/a", &json!({})).is_err());
		assert!(handler.validate_spec(&"x".repeat(64), &json!({})).is_err());
	}

	#[test]
	fn test_namespace_context_carries_tenant_labels() {
		let handler = NamespaceHandler;
		let context = handler.template_context("team-a", "t1", Some("c1"), &json!({}));
		assert_eq!(context["labels"]["tenant.io/id"], "t1");
		assert_eq!(context["labels"]["managed-by"], "strata");
		assert_eq!(context["cluster_id"], "c1");
	}

	#[test]
	fn test_vm_requires_instance_type_and_image() {
		let handler = VmHandler;
		assert!(handler.validate_spec("web-1", &json!({"image": "ami-1"})).is_err());
		assert!(handler
			.validate_spec("web-1", &json!({"instance_type": "t3.micro", "image": "ami-1"}))
			.is_ok());
	}

	#[test]
	fn test_vm_rejects_unknown_instance_type() {
		let handler = VmHandler;
		let result = handler.validate_spec(
			"web-1",
			&json!({"instance_type": "z9.mega", "image": "ami-1"}),
		);
		assert!(result.is_err());
	}

	#[test]
	fn test_vm_disk_size_bounds() {
		let handler = VmHandler;
		let ok = json!({"instance_type": "t3.micro", "image": "ami-1", "disk_size": 100});
		let too_small = json!({"instance_type": "t3.micro", "image": "ami-1", "disk_size": 4});
		let not_a_number =
			json!({"instance_type": "t3.micro", "image": "ami-1", "disk_size": "big"});
		assert!(handler.validate_spec("web-1", &ok).is_ok());
		assert!(handler.validate_spec("web-1", &too_small).is_err());
		assert!(handler.validate_spec("web-1", &not_a_number).is_err());
	}

	#[test]
	fn test_generic_rejects_non_object_spec() {
		let handler = GenericHandler;
		assert!(handler.validate_spec("x", &json!("not an object")).is_err());
		assert!(handler.validate_spec("x", &json!({})).is_ok());
	}

	#[test]
	fn test_spec_fields_never_shadow_identity() {
		let handler = GenericHandler;
		let context = handler.template_context(
			"real-name",
			"t1",
			None,
			&json!({"name": "spoofed", "tenant_id": "t2"}),
		);
		assert_eq!(context["name"], "real-name");
		assert_eq!(context["tenant_id"], "t1");
	}
}
