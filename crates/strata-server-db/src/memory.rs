// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory job store. Single-process, lost on restart; development mode
//! only. The durable SQLite store in [`crate::sqlite`] exposes the same
//! interface.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::store::{merge_metadata, JobStore};
use crate::types::{Job, JobFilter, JobStatus, LogEntry};

#[derive(Default)]
pub struct MemoryJobStore {
	jobs: RwLock<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl JobStore for MemoryJobStore {
	async fn create(&self, job: &Job) -> Result<()> {
		let mut jobs = self.jobs.write().await;
		if jobs.contains_key(&job.id) {
			return Err(DbError::Conflict(format!("job {} already exists", job.id)));
		}
		jobs.insert(job.id, job.clone());
		Ok(())
	}

	async fn get(&self, job_id: Uuid, tenant_id: &str) -> Result<Job> {
		let jobs = self.jobs.read().await;
		let job = jobs
			.get(&job_id)
			.ok_or_else(|| DbError::NotFound(job_id.to_string()))?;
		if job.tenant_id != tenant_id {
			return Err(DbError::Forbidden);
		}
		Ok(job.clone())
	}

	async fn append_log(&self, job_id: Uuid, entry: LogEntry) -> Result<()> {
		let mut jobs = self.jobs.write().await;
		let job = jobs
			.get_mut(&job_id)
			.ok_or_else(|| DbError::NotFound(job_id.to_string()))?;
		job.logs.push(entry);
		job.updated_at = Utc::now();
		Ok(())
	}

	async fn update_status(
		&self,
		job_id: Uuid,
		status: JobStatus,
		metadata_patch: Option<serde_json::Value>,
	) -> Result<()> {
		let mut jobs = self.jobs.write().await;
		let job = jobs
			.get_mut(&job_id)
			.ok_or_else(|| DbError::NotFound(job_id.to_string()))?;
		if !job.status.can_transition_to(status) {
			return Err(DbError::Conflict(format!(
				"illegal transition {} -> {}",
				job.status, status
			)));
		}
		job.status = status;
		merge_metadata(&mut job.metadata, metadata_patch);
		job.updated_at = Utc::now();
		Ok(())
	}

	async fn list_by_tenant(&self, tenant_id: &str, filter: &JobFilter) -> Result<Vec<Job>> {
		let jobs = self.jobs.read().await;
		let mut matched: Vec<Job> = jobs
			.values()
			.filter(|job| job.tenant_id == tenant_id)
			.filter(|job| {
				filter
					.resource_type
					.as_deref()
					.map_or(true, |rt| job.resource_type == rt)
			})
			.filter(|job| filter.status.map_or(true, |s| job.status == s))
			.cloned()
			.collect();

		matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let offset = filter.offset.unwrap_or(0) as usize;
		let limit = filter.limit.unwrap_or(50) as usize;
		Ok(matched.into_iter().skip(offset).take(limit).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Operation;

	fn sample_job(tenant: &str) -> Job {
		Job::new(
			tenant.to_string(),
			Some("c1".to_string()),
			"namespace".to_string(),
			"team-a".to_string(),
			Operation::Create,
			"small".to_string(),
			serde_json::json!({"name": "team-a"}),
		)
	}

	#[tokio::test]
	async fn test_create_and_get() {
		let store = MemoryJobStore::new();
		let job = sample_job("t1");
		store.create(&job).await.unwrap();

		let fetched = store.get(job.id, "t1").await.unwrap();
		assert_eq!(fetched.id, job.id);
		assert_eq!(fetched.status, JobStatus::Submitted);
	}

	#[tokio::test]
	async fn test_cross_tenant_get_is_forbidden() {
		let store = MemoryJobStore::new();
		let job = sample_job("t1");
		store.create(&job).await.unwrap();

		match store.get(job.id, "t2").await {
			Err(DbError::Forbidden) => {}
			other => panic!("expected Forbidden, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_unknown_job_is_not_found() {
		let store = MemoryJobStore::new();
		match store.get(Uuid::new_v4(), "t1").await {
			Err(DbError::NotFound(_)) => {}
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_status_regression_rejected() {
		let store = MemoryJobStore::new();
		let job = sample_job("t1");
		store.create(&job).await.unwrap();

		store
			.update_status(job.id, JobStatus::Rendering, None)
			.await
			.unwrap();
		store
			.update_status(job.id, JobStatus::Committing, None)
			.await
			.unwrap();

		match store.update_status(job.id, JobStatus::Rendering, None).await {
			Err(DbError::Conflict(_)) => {}
			other => panic!("expected Conflict, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_metadata_patch_merges() {
		let store = MemoryJobStore::new();
		let job = sample_job("t1");
		store.create(&job).await.unwrap();

		store
			.update_status(
				job.id,
				JobStatus::Rendering,
				Some(serde_json::json!({"commit_id": "abc"})),
			)
			.await
			.unwrap();
		store
			.update_status(
				job.id,
				JobStatus::Committing,
				Some(serde_json::json!({"webhook_failed": true})),
			)
			.await
			.unwrap();

		let fetched = store.get(job.id, "t1").await.unwrap();
		assert_eq!(fetched.metadata["commit_id"], "abc");
		assert_eq!(fetched.metadata["webhook_failed"], true);
	}

	#[tokio::test]
	async fn test_list_by_tenant_filters() {
		let store = MemoryJobStore::new();
		let a = sample_job("t1");
		let mut b = sample_job("t1");
		b.resource_type = "vm".to_string();
		let c = sample_job("t2");
		store.create(&a).await.unwrap();
		store.create(&b).await.unwrap();
		store.create(&c).await.unwrap();

		let all = store.list_by_tenant("t1", &JobFilter::default()).await.unwrap();
		assert_eq!(all.len(), 2);

		let vms = store
			.list_by_tenant(
				"t1",
				&JobFilter {
					resource_type: Some("vm".to_string()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(vms.len(), 1);
		assert_eq!(vms[0].id, b.id);
	}

	#[tokio::test]
	async fn test_append_log_grows_only() {
		let store = MemoryJobStore::new();
		let job = sample_job("t1");
		store.create(&job).await.unwrap();

		store
			.append_log(job.id, LogEntry::now("Job created"))
			.await
			.unwrap();
		store
			.append_log(job.id, LogEntry::now("Rendering manifest"))
			.await
			.unwrap();

		let fetched = store.get(job.id, "t1").await.unwrap();
		assert_eq!(fetched.logs.len(), 2);
		assert_eq!(fetched.logs[0].message, "Job created");
	}
}
