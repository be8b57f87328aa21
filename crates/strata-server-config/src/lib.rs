// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Strata server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`STRATA_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use strata_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use strata_server_registry::ResourceTypeConfig;
use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub gitops: GitOpsConfig,
	pub jobs: JobsConfig,
	pub logging: LoggingConfig,
	pub resource_types: Vec<ResourceTypeConfig>,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

impl Default for ServerConfig {
	fn default() -> Self {
		finalize(ServerConfigLayer::default())
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`STRATA_SERVER_*`)
/// 2. Config file (`/etc/strata/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	let config = finalize(merged);
	info!(
		host = %config.http.host,
		port = config.http.port,
		resource_types = config.resource_types.len(),
		"configuration resolved"
	);
	Ok(config)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> ServerConfig {
	ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		gitops: layer.gitops.unwrap_or_default().finalize(),
		jobs: layer.jobs.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		resource_types: finalize_resource_types(layer.resource_types),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_defaults_resolve() {
		let config = ServerConfig::default();
		assert_eq!(config.socket_addr(), "127.0.0.1:8080");
		assert_eq!(config.database.mode, DatabaseMode::Sqlite);
		assert!(!config.resource_types.is_empty());
	}

	#[test]
	fn test_toml_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[http]
port = 9999

[database]
mode = "memory"

[jobs]
max_attempts = 5

[resource_types.widget]
repo_url = "https://git.example.com/org/widgets.git"
template_dir = "widgets"
cluster_aware = false
flavors = ["basic"]
"#
		)
		.unwrap();

		let config = load_config_with_file(file.path()).unwrap();
		assert_eq!(config.http.port, 9999);
		assert_eq!(config.database.mode, DatabaseMode::Memory);
		assert_eq!(config.jobs.max_attempts, 5);

		let widget = config
			.resource_types
			.iter()
			.find(|t| t.name == "widget")
			.expect("configured type registered");
		assert_eq!(widget.template_dir, "widgets");
		assert!(!widget.cluster_aware);
		// Stock types survive alongside the new one.
		assert!(config.resource_types.iter().any(|t| t.name == "namespace"));
	}

	#[test]
	fn test_malformed_toml_is_an_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[http\nport = 1").unwrap();
		let err = load_config_with_file(file.path()).unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}
}
