// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and response shapes for the HTTP API.

use serde::{Deserialize, Serialize};
use strata_server_db::{Job, JobStatus};
use strata_server_registry::{ResourceTypeConfig, WebhookMode};
use uuid::Uuid;

/// Body of a lifecycle submission.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
	pub name: String,
	#[serde(default = "default_flavor")]
	pub flavor: String,
	#[serde(default = "default_spec")]
	pub spec: serde_json::Value,
}

fn default_flavor() -> String {
	strata_server_registry::FLAVOR_CUSTOM.to_string()
}

fn default_spec() -> serde_json::Value {
	serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
	pub job_id: Uuid,
	pub status: JobStatus,
	pub message: String,
}

impl From<&Job> for SubmitResponse {
	fn from(job: &Job) -> Self {
		Self {
			job_id: job.id,
			status: job.status,
			message: format!(
				"Accepted {} for {}/{}",
				job.operation, job.resource_type, job.resource_name
			),
		}
	}
}

/// Query parameters for `GET /api/v1/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
	pub resource_type: Option<String>,
	pub status: Option<String>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
	pub jobs: Vec<Job>,
}

/// Public view of a resource type; signing secrets never leave the server.
#[derive(Debug, Serialize)]
pub struct ResourceTypeInfo {
	pub name: String,
	pub cluster_aware: bool,
	pub flavors: Vec<String>,
	pub webhook: WebhookInfo,
}

#[derive(Debug, Serialize)]
pub struct WebhookInfo {
	pub enabled: bool,
	pub mode: WebhookMode,
	pub mandatory: bool,
}

impl From<&ResourceTypeConfig> for ResourceTypeInfo {
	fn from(config: &ResourceTypeConfig) -> Self {
		Self {
			name: config.name.clone(),
			cluster_aware: config.cluster_aware,
			flavors: config.flavors.clone(),
			webhook: WebhookInfo {
				enabled: config.webhook.enabled,
				mode: config.webhook.mode,
				mandatory: config.webhook.mandatory,
			},
		}
	}
}

#[derive(Debug, Serialize)]
pub struct ResourceTypesResponse {
	pub resource_types: Vec<ResourceTypeInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
}
