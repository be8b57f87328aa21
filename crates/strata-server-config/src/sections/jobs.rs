// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job engine tunables.

use serde::Deserialize;

/// Jobs configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct JobsConfig {
	pub max_concurrency: usize,
	pub step_timeout_secs: u64,
	pub max_attempts: u32,
}

impl Default for JobsConfig {
	fn default() -> Self {
		Self {
			max_concurrency: 8,
			step_timeout_secs: 120,
			max_attempts: 3,
		}
	}
}

/// Jobs configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobsConfigLayer {
	#[serde(default)]
	pub max_concurrency: Option<usize>,
	#[serde(default)]
	pub step_timeout_secs: Option<u64>,
	#[serde(default)]
	pub max_attempts: Option<u32>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: JobsConfigLayer) {
		if other.max_concurrency.is_some() {
			self.max_concurrency = other.max_concurrency;
		}
		if other.step_timeout_secs.is_some() {
			self.step_timeout_secs = other.step_timeout_secs;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		let defaults = JobsConfig::default();
		JobsConfig {
			max_concurrency: self.max_concurrency.unwrap_or(defaults.max_concurrency),
			step_timeout_secs: self.step_timeout_secs.unwrap_or(defaults.step_timeout_secs),
			max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = JobsConfigLayer::default().finalize();
		assert_eq!(config.max_concurrency, 8);
		assert_eq!(config.step_timeout_secs, 120);
		assert_eq!(config.max_attempts, 3);
	}
}
