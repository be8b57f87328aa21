// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
	#[error("webhook delivery failed: {0}")]
	Delivery(#[from] reqwest::Error),

	#[error("webhook endpoint returned status {0}")]
	Status(u16),

	#[error("webhook delivery exhausted {0} attempts")]
	RetriesExhausted(u32),

	#[error("failed to serialize webhook payload: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WebhookError>;
