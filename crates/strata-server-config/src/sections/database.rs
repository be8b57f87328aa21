// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job store backing configuration.

use serde::Deserialize;

/// Which `JobStore` backing the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
	/// In-memory store; jobs are lost on restart.
	Memory,
	/// SQLite store at the configured url.
	Sqlite,
}

impl std::str::FromStr for DatabaseMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"memory" => Ok(DatabaseMode::Memory),
			"sqlite" => Ok(DatabaseMode::Sqlite),
			_ => Err(format!("unknown database mode: {s}")),
		}
	}
}

/// Database configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub mode: DatabaseMode,
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			mode: DatabaseMode::Sqlite,
			url: "sqlite:./strata.db".to_string(),
		}
	}
}

/// Database configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub mode: Option<DatabaseMode>,
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.mode.is_some() {
			self.mode = other.mode;
		}
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		let defaults = DatabaseConfig::default();
		DatabaseConfig {
			mode: self.mode.unwrap_or(defaults.mode),
			url: self.url.unwrap_or(defaults.url),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_sqlite() {
		let config = DatabaseConfigLayer::default().finalize();
		assert_eq!(config.mode, DatabaseMode::Sqlite);
		assert_eq!(config.url, "sqlite:./strata.db");
	}

	#[test]
	fn test_mode_parses() {
		assert_eq!("memory".parse::<DatabaseMode>().unwrap(), DatabaseMode::Memory);
		assert!("postgres".parse::<DatabaseMode>().is_err());
	}
}
