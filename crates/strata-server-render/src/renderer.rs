// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use minijinja::{path_loader, Environment, UndefinedBehavior};
use serde_json::Value;
use strata_server_registry::{RegisteredType, FLAVOR_CUSTOM};

use crate::error::{RenderError, Result};

/// Built-in template used for the "custom" flavor: identity header plus
/// the full inline spec.
const CUSTOM_TEMPLATE: &str = "\
apiVersion: strata.io/v1
kind: CustomResource
metadata:
  name: {{ name }}
  labels:
    tenant.io/id: {{ tenant_id }}
    managed-by: strata
spec:
{{ spec | to_yaml | indent(2, true) }}";

pub struct ManifestRenderer {
	templates_root: PathBuf,
}

impl ManifestRenderer {
	pub fn new(templates_root: impl Into<PathBuf>) -> Self {
		Self {
			templates_root: templates_root.into(),
		}
	}

	fn environment(&self) -> Environment<'static> {
		let mut env = Environment::new();
		env.set_loader(path_loader(&self.templates_root));
		env.set_undefined_behavior(UndefinedBehavior::Strict);
		env.add_filter("to_yaml", to_yaml);
		env
	}

	/// Render a manifest for the given resource. Validates the spec
	/// through the type's handler first; both validation and render
	/// failures are fatal for the job.
	#[tracing::instrument(skip(self, entry, spec), fields(resource_type = %entry.config.name, flavor))]
	pub fn render(
		&self,
		entry: &RegisteredType,
		flavor: &str,
		name: &str,
		tenant_id: &str,
		cluster_id: Option<&str>,
		spec: &Value,
	) -> Result<String> {
		entry.handler.validate_spec(name, spec)?;

		let context = entry.handler.template_context(name, tenant_id, cluster_id, spec);
		let env = self.environment();

		if flavor == FLAVOR_CUSTOM {
			// The open flavor bypasses flavor-specific lookup and carries
			// the full inline spec instead.
			let mut context = match context {
				Value::Object(map) => map,
				_ => serde_json::Map::new(),
			};
			context.insert("spec".to_string(), spec.clone());

			let rendered = env
				.render_str(CUSTOM_TEMPLATE, Value::Object(context))
				.map_err(|e| RenderError::TemplateRenderError(e.to_string()))?;
			return Ok(rendered);
		}

		let template_name = format!("{}/{}.yaml.j2", entry.config.template_dir, flavor);
		if !self.template_path(&template_name).is_file() {
			return Err(RenderError::TemplateNotFound(template_name));
		}

		let template = env
			.get_template(&template_name)
			.map_err(|e| RenderError::TemplateRenderError(e.to_string()))?;
		template
			.render(context)
			.map_err(|e| RenderError::TemplateRenderError(e.to_string()))
	}

	fn template_path(&self, template_name: &str) -> PathBuf {
		let mut path = self.templates_root.clone();
		for part in template_name.split('/') {
			path.push(part);
		}
		path
	}

	pub fn templates_root(&self) -> &Path {
		&self.templates_root
	}
}

fn to_yaml(value: minijinja::Value) -> std::result::Result<String, minijinja::Error> {
	serde_yaml::to_string(&value).map_err(|e| {
		minijinja::Error::new(
			minijinja::ErrorKind::InvalidOperation,
			format!("cannot serialize value to YAML: {e}"),
		)
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use strata_server_registry::{
		builtin_handler, RegisteredType, ResourceTypeConfig, WebhookPolicy,
	};

	fn namespace_entry(template_dir: &str) -> RegisteredType {
		RegisteredType {
			config: ResourceTypeConfig {
				name: "namespace".to_string(),
				repo_url: "https://git.example.com/infra.git".to_string(),
				template_dir: template_dir.to_string(),
				cluster_aware: true,
				flavors: vec!["small".to_string()],
				webhook: WebhookPolicy::default(),
			},
			handler: builtin_handler("namespace"),
		}
	}

	fn write_template(root: &Path, rel: &str, contents: &str) {
		let path = root.join(rel);
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(path, contents).unwrap();
	}

	#[test]
	fn test_render_flavor_template() {
		let dir = tempfile::tempdir().unwrap();
		write_template(
			dir.path(),
			"namespaces/small.yaml.j2",
			"apiVersion: v1\nkind: Namespace\nmetadata:\n  name: {{ name }}\n  tenant: {{ tenant_id }}\n",
		);

		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");
		let manifest = renderer
			.render(&entry, "small", "team-a", "t1", Some("c1"), &json!({}))
			.unwrap();

		assert!(manifest.contains("name: team-a"));
		assert!(manifest.contains("tenant: t1"));
	}

	#[test]
	fn test_render_is_idempotent() {
		let dir = tempfile::tempdir().unwrap();
		write_template(
			dir.path(),
			"namespaces/small.yaml.j2",
			"name: {{ name }}\nlabels:\n{% for key, value in labels | dictsort %}  {{ key }}: \"{{ value }}\"\n{% endfor %}",
		);

		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");
		let spec = json!({"labels": {"env": "dev", "team": "core"}});

		let first = renderer
			.render(&entry, "small", "team-a", "t1", Some("c1"), &spec)
			.unwrap();
		for _ in 0..5 {
			let again = renderer
				.render(&entry, "small", "team-a", "t1", Some("c1"), &spec)
				.unwrap();
			assert_eq!(first, again);
		}
	}

	#[test]
	fn test_missing_template_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");

		match renderer.render(&entry, "small", "team-a", "t1", None, &json!({})) {
			Err(RenderError::TemplateNotFound(name)) => {
				assert_eq!(name, "namespaces/small.yaml.j2")
			}
			other => panic!("expected TemplateNotFound, got {other:?}"),
		}
	}

	#[test]
	fn test_missing_required_field_errors() {
		let dir = tempfile::tempdir().unwrap();
		write_template(
			dir.path(),
			"namespaces/small.yaml.j2",
			"quota: {{ resource_quota.cpu }}\n",
		);

		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");

		match renderer.render(&entry, "small", "team-a", "t1", None, &json!({})) {
			Err(RenderError::TemplateRenderError(_)) => {}
			other => panic!("expected TemplateRenderError, got {other:?}"),
		}
	}

	#[test]
	fn test_custom_flavor_inlines_full_spec() {
		let dir = tempfile::tempdir().unwrap();
		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");
		let spec = json!({"replicas": 3, "image": "nginx:1.27"});

		let manifest = renderer
			.render(&entry, "custom", "edge-proxy", "t1", Some("c1"), &spec)
			.unwrap();

		assert!(manifest.contains("name: edge-proxy"));
		assert!(manifest.contains("tenant.io/id: t1"));
		assert!(manifest.contains("replicas: 3"));
		assert!(manifest.contains("image: nginx:1.27"));
	}

	#[test]
	fn test_custom_flavor_is_idempotent() {
		let dir = tempfile::tempdir().unwrap();
		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");
		let spec = json!({"b": 2, "a": 1, "nested": {"z": true, "y": false}});

		let first = renderer
			.render(&entry, "custom", "thing", "t1", None, &spec)
			.unwrap();
		let second = renderer
			.render(&entry, "custom", "thing", "t1", None, &spec)
			.unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn test_invalid_spec_rejected_before_render() {
		let dir = tempfile::tempdir().unwrap();
		write_template(dir.path(), "namespaces/small.yaml.j2", "name: {{ name }}\n");

		let renderer = ManifestRenderer::new(dir.path());
		let entry = namespace_entry("namespaces");

		match renderer.render(&entry, "small", "bad/name", "t1", None, &json!({})) {
			Err(RenderError::InvalidSpec(_)) => {}
			other => panic!("expected InvalidSpec, got {other:?}"),
		}
	}
}
