// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Tunables for the job engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Jobs executing concurrently across all lanes.
	pub max_concurrency: usize,
	/// Wall-clock budget for a single render or commit attempt.
	/// Webhook deliveries are bounded by their policy instead.
	pub step_timeout: Duration,
	/// Attempts per retryable step before the job fails.
	pub max_attempts: u32,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			max_concurrency: 8,
			step_timeout: Duration::from_secs(120),
			max_attempts: 3,
		}
	}
}
