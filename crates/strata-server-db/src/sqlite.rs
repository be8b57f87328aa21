// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::store::{merge_metadata, JobStore};
use crate::types::{Job, JobFilter, JobStatus, LogEntry, Operation};

type JobRow = (
	String,         // id
	String,         // tenant_id
	Option<String>, // cluster_id
	String,         // resource_type
	String,         // resource_name
	String,         // operation
	String,         // flavor
	String,         // spec
	String,         // status
	String,         // metadata
	DateTime<Utc>,  // created_at
	DateTime<Utc>,  // updated_at
);

const JOB_COLUMNS: &str = "id, tenant_id, cluster_id, resource_type, resource_name, operation, \
	 flavor, spec, status, metadata, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteJobStore {
	pool: SqlitePool,
}

impl SqliteJobStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	fn row_to_job(row: JobRow, logs: Vec<LogEntry>) -> Result<Job> {
		let (
			id,
			tenant_id,
			cluster_id,
			resource_type,
			resource_name,
			operation,
			flavor,
			spec,
			status,
			metadata,
			created_at,
			updated_at,
		) = row;

		let metadata: serde_json::Value = serde_json::from_str(&metadata)?;
		let metadata = match metadata {
			serde_json::Value::Object(map) => map,
			_ => serde_json::Map::new(),
		};

		Ok(Job {
			id: id
				.parse::<Uuid>()
				.map_err(|e| DbError::Internal(format!("invalid job id: {e}")))?,
			tenant_id,
			cluster_id,
			resource_type,
			resource_name,
			operation: operation.parse::<Operation>().map_err(DbError::Internal)?,
			flavor,
			spec: serde_json::from_str(&spec)?,
			status: status.parse::<JobStatus>().map_err(DbError::Internal)?,
			logs,
			metadata,
			created_at,
			updated_at,
		})
	}

	async fn load_logs(&self, job_id: Uuid) -> Result<Vec<LogEntry>> {
		let rows = sqlx::query_as::<_, (DateTime<Utc>, String)>(
			"SELECT at, message FROM job_logs WHERE job_id = ? ORDER BY rowid",
		)
		.bind(job_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|(at, message)| LogEntry { at, message })
			.collect())
	}

	async fn fetch_row(&self, job_id: Uuid) -> Result<JobRow> {
		sqlx::query_as::<_, JobRow>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
			.bind(job_id.to_string())
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| DbError::NotFound(job_id.to_string()))
	}
}

#[async_trait]
impl JobStore for SqliteJobStore {
	#[tracing::instrument(skip(self, job), fields(job_id = %job.id))]
	async fn create(&self, job: &Job) -> Result<()> {
		let result = sqlx::query(
			r#"
			INSERT OR IGNORE INTO jobs (id, tenant_id, cluster_id, resource_type, resource_name,
				operation, flavor, spec, status, metadata, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(job.id.to_string())
		.bind(&job.tenant_id)
		.bind(&job.cluster_id)
		.bind(&job.resource_type)
		.bind(&job.resource_name)
		.bind(job.operation.as_str())
		.bind(&job.flavor)
		.bind(job.spec.to_string())
		.bind(job.status.as_str())
		.bind(serde_json::Value::Object(job.metadata.clone()).to_string())
		.bind(job.created_at)
		.bind(job.updated_at)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::Conflict(format!("job {} already exists", job.id)));
		}

		for entry in &job.logs {
			sqlx::query("INSERT INTO job_logs (job_id, at, message) VALUES (?, ?, ?)")
				.bind(job.id.to_string())
				.bind(entry.at)
				.bind(&entry.message)
				.execute(&self.pool)
				.await?;
		}

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	async fn get(&self, job_id: Uuid, tenant_id: &str) -> Result<Job> {
		let row = self.fetch_row(job_id).await?;
		if row.1 != tenant_id {
			return Err(DbError::Forbidden);
		}
		let logs = self.load_logs(job_id).await?;
		Self::row_to_job(row, logs)
	}

	#[tracing::instrument(skip(self, entry))]
	async fn append_log(&self, job_id: Uuid, entry: LogEntry) -> Result<()> {
		let result = sqlx::query("INSERT INTO job_logs (job_id, at, message) SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM jobs WHERE id = ?)")
			.bind(job_id.to_string())
			.bind(entry.at)
			.bind(&entry.message)
			.bind(job_id.to_string())
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(job_id.to_string()));
		}

		sqlx::query("UPDATE jobs SET updated_at = ? WHERE id = ?")
			.bind(Utc::now())
			.bind(job_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, metadata_patch))]
	async fn update_status(
		&self,
		job_id: Uuid,
		status: JobStatus,
		metadata_patch: Option<serde_json::Value>,
	) -> Result<()> {
		let row = self.fetch_row(job_id).await?;

		let current = row.8.parse::<JobStatus>().map_err(DbError::Internal)?;
		if !current.can_transition_to(status) {
			return Err(DbError::Conflict(format!(
				"illegal transition {current} -> {status}"
			)));
		}

		let metadata: serde_json::Value = serde_json::from_str(&row.9)?;
		let mut metadata = match metadata {
			serde_json::Value::Object(map) => map,
			_ => serde_json::Map::new(),
		};
		merge_metadata(&mut metadata, metadata_patch);

		// Compare-and-swap on the status read above, so a writer that
		// lost a race cannot overwrite the other side's transition.
		let result = sqlx::query(
			"UPDATE jobs SET status = ?, metadata = ?, updated_at = ? WHERE id = ? AND status = ?",
		)
		.bind(status.as_str())
		.bind(serde_json::Value::Object(metadata).to_string())
		.bind(Utc::now())
		.bind(job_id.to_string())
		.bind(current.as_str())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::Conflict(format!(
				"job {job_id} moved past {current} concurrently"
			)));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self, filter))]
	async fn list_by_tenant(&self, tenant_id: &str, filter: &JobFilter) -> Result<Vec<Job>> {
		let limit = filter.limit.unwrap_or(50) as i64;
		let offset = filter.offset.unwrap_or(0) as i64;
		let status = filter.status.map(|s| s.as_str().to_string());

		let rows = sqlx::query_as::<_, JobRow>(&format!(
			r#"
			SELECT {JOB_COLUMNS} FROM jobs
			WHERE tenant_id = ?
			  AND (? IS NULL OR resource_type = ?)
			  AND (? IS NULL OR status = ?)
			ORDER BY created_at DESC
			LIMIT ? OFFSET ?
			"#
		))
		.bind(tenant_id)
		.bind(&filter.resource_type)
		.bind(&filter.resource_type)
		.bind(&status)
		.bind(&status)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let mut jobs = Vec::with_capacity(rows.len());
		for row in rows {
			let job_id = row
				.0
				.parse::<Uuid>()
				.map_err(|e| DbError::Internal(format!("invalid job id: {e}")))?;
			let logs = self.load_logs(job_id).await?;
			jobs.push(Self::row_to_job(row, logs)?);
		}
		Ok(jobs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_job_test_pool;
	use crate::types::Operation;

	fn sample_job(tenant: &str, name: &str) -> Job {
		Job::new(
			tenant.to_string(),
			Some("c1".to_string()),
			"namespace".to_string(),
			name.to_string(),
			Operation::Create,
			"small".to_string(),
			serde_json::json!({"name": name}),
		)
	}

	#[tokio::test]
	async fn test_create_get_round_trip() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		let mut job = sample_job("t1", "team-a");
		job.logs.push(LogEntry::now("Job created"));
		store.create(&job).await.unwrap();

		let fetched = store.get(job.id, "t1").await.unwrap();
		assert_eq!(fetched.tenant_id, "t1");
		assert_eq!(fetched.resource_name, "team-a");
		assert_eq!(fetched.status, JobStatus::Submitted);
		assert_eq!(fetched.logs.len(), 1);
		assert_eq!(fetched.spec["name"], "team-a");
	}

	#[tokio::test]
	async fn test_duplicate_create_conflicts() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		let job = sample_job("t1", "team-a");
		store.create(&job).await.unwrap();
		match store.create(&job).await {
			Err(DbError::Conflict(_)) => {}
			other => panic!("expected Conflict, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_cross_tenant_get_is_forbidden() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		let job = sample_job("t1", "team-a");
		store.create(&job).await.unwrap();

		match store.get(job.id, "t2").await {
			Err(DbError::Forbidden) => {}
			other => panic!("expected Forbidden, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_update_status_and_metadata() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		let job = sample_job("t1", "team-a");
		store.create(&job).await.unwrap();

		store
			.update_status(job.id, JobStatus::Rendering, None)
			.await
			.unwrap();
		store
			.update_status(
				job.id,
				JobStatus::Committing,
				Some(serde_json::json!({"commit_id": "deadbeef"})),
			)
			.await
			.unwrap();

		let fetched = store.get(job.id, "t1").await.unwrap();
		assert_eq!(fetched.status, JobStatus::Committing);
		assert_eq!(fetched.metadata["commit_id"], "deadbeef");
	}

	#[tokio::test]
	async fn test_status_regression_rejected() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		let job = sample_job("t1", "team-a");
		store.create(&job).await.unwrap();
		store
			.update_status(job.id, JobStatus::Rendering, None)
			.await
			.unwrap();

		match store.update_status(job.id, JobStatus::Submitted, None).await {
			Err(DbError::Conflict(_)) => {}
			other => panic!("expected Conflict, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_concurrent_transition_single_winner() {
		use crate::pool::{create_pool, run_migrations};

		// A shared on-disk database so both writers hit the same rows
		// regardless of which pooled connection they draw.
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite://{}/jobs.db", dir.path().display());
		let pool = create_pool(&url).await.unwrap();
		run_migrations(&pool).await.unwrap();
		let store = std::sync::Arc::new(SqliteJobStore::new(pool));

		for round in 0..20 {
			let job = sample_job("t1", &format!("team-{round}"));
			store.create(&job).await.unwrap();

			let first = {
				let store = store.clone();
				tokio::spawn(async move {
					store.update_status(job.id, JobStatus::Rendering, None).await
				})
			};
			let second = {
				let store = store.clone();
				tokio::spawn(async move {
					store.update_status(job.id, JobStatus::Rendering, None).await
				})
			};

			let outcomes = [first.await.unwrap(), second.await.unwrap()];
			let winners = outcomes.iter().filter(|r| r.is_ok()).count();
			assert_eq!(winners, 1, "exactly one writer may apply a transition");
			assert!(outcomes
				.iter()
				.any(|r| matches!(r, Err(DbError::Conflict(_)))));

			let fetched = store.get(job.id, "t1").await.unwrap();
			assert_eq!(fetched.status, JobStatus::Rendering);
		}
	}

	#[tokio::test]
	async fn test_list_by_tenant_scoping_and_order() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		let a = sample_job("t1", "one");
		let b = sample_job("t1", "two");
		let c = sample_job("t2", "other");
		store.create(&a).await.unwrap();
		store.create(&b).await.unwrap();
		store.create(&c).await.unwrap();

		let jobs = store.list_by_tenant("t1", &JobFilter::default()).await.unwrap();
		assert_eq!(jobs.len(), 2);
		assert!(jobs.iter().all(|j| j.tenant_id == "t1"));
	}

	#[tokio::test]
	async fn test_append_log_to_unknown_job() {
		let pool = create_job_test_pool().await;
		let store = SqliteJobStore::new(pool);

		match store
			.append_log(Uuid::new_v4(), LogEntry::now("orphan"))
			.await
		{
			Err(DbError::NotFound(_)) => {}
			other => panic!("expected NotFound, got {other:?}"),
		}
	}
}
