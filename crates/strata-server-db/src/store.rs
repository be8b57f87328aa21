// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Job, JobFilter, JobStatus, LogEntry};

/// Backing-agnostic job persistence.
///
/// Reads are safe concurrently; writes to a single job come from exactly
/// one worker at a time. `get` and `list_by_tenant` enforce tenant
/// isolation: a job is only ever visible to the tenant that submitted it.
#[async_trait]
pub trait JobStore: Send + Sync {
	async fn create(&self, job: &Job) -> Result<()>;

	/// Fetch a job. Returns `NotFound` for unknown ids and `Forbidden`
	/// when the job belongs to a different tenant.
	async fn get(&self, job_id: Uuid, tenant_id: &str) -> Result<Job>;

	async fn append_log(&self, job_id: Uuid, entry: LogEntry) -> Result<()>;

	/// Advance the status and merge `metadata_patch` into the job's
	/// metadata map. Rejects transitions that are not a forward walk
	/// through the state machine with `Conflict`.
	async fn update_status(
		&self,
		job_id: Uuid,
		status: JobStatus,
		metadata_patch: Option<serde_json::Value>,
	) -> Result<()>;

	async fn list_by_tenant(&self, tenant_id: &str, filter: &JobFilter) -> Result<Vec<Job>>;
}

pub(crate) fn merge_metadata(
	metadata: &mut serde_json::Map<String, serde_json::Value>,
	patch: Option<serde_json::Value>,
) {
	if let Some(serde_json::Value::Object(patch)) = patch {
		for (key, value) in patch {
			metadata.insert(key, value);
		}
	}
}
