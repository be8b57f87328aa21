// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Which pipeline stage a staged notification reports on. Final
/// notifications (single mode, or the last staged delivery) carry no
/// stage and report the job's terminal status instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStage {
	Rendered,
	Committed,
}

impl WebhookStage {
	pub fn as_str(&self) -> &'static str {
		match self {
			WebhookStage::Rendered => "rendered",
			WebhookStage::Committed => "committed",
		}
	}
}

/// Notification body delivered to a tenant webhook endpoint.
///
/// Serialize once with [`WebhookPayload::to_body`] and reuse the bytes
/// across retries so every attempt is byte-identical and the signature
/// stays valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
	pub job_id: Uuid,
	pub resource_type: String,
	pub resource_name: String,
	pub tenant_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cluster_id: Option<String>,
	pub status: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stage: Option<WebhookStage>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub commit_id: Option<String>,
	pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
	pub fn to_body(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}

	/// Deduplication token for the receiver: one per job and stage, so
	/// redelivered attempts of the same notification share a key.
	pub fn idempotency_key(&self) -> String {
		match self.stage {
			Some(stage) => format!("{}:{}", self.job_id, stage.as_str()),
			None => format!("{}:final", self.job_id),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(stage: Option<WebhookStage>) -> WebhookPayload {
		WebhookPayload {
			job_id: Uuid::nil(),
			resource_type: "vm".to_string(),
			resource_name: "web-01".to_string(),
			tenant_id: "t1".to_string(),
			cluster_id: None,
			status: "committing".to_string(),
			stage,
			commit_id: None,
			timestamp: Utc::now(),
		}
	}

	#[test]
	fn test_idempotency_key_per_stage() {
		assert_eq!(
			payload(Some(WebhookStage::Rendered)).idempotency_key(),
			"00000000-0000-0000-0000-000000000000:rendered"
		);
		assert_eq!(
			payload(None).idempotency_key(),
			"00000000-0000-0000-0000-000000000000:final"
		);
	}

	#[test]
	fn test_body_omits_absent_fields() {
		let body = payload(None).to_body().unwrap();
		let text = String::from_utf8(body).unwrap();
		assert!(!text.contains("cluster_id"));
		assert!(!text.contains("stage"));
		assert!(!text.contains("commit_id"));
	}

	#[test]
	fn test_body_is_stable_across_calls() {
		let p = payload(Some(WebhookStage::Committed));
		assert_eq!(p.to_body().unwrap(), p.to_body().unwrap());
	}
}
