// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

pub async fn create_test_pool() -> SqlitePool {
	SqlitePool::connect(":memory:").await.unwrap()
}

pub async fn create_jobs_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS jobs (
			id TEXT PRIMARY KEY,
			tenant_id TEXT NOT NULL,
			cluster_id TEXT,
			resource_type TEXT NOT NULL,
			resource_name TEXT NOT NULL,
			operation TEXT NOT NULL CHECK (operation IN ('create', 'update', 'delete')),
			flavor TEXT NOT NULL,
			spec TEXT NOT NULL,
			status TEXT NOT NULL,
			metadata TEXT NOT NULL DEFAULT '{}',
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_tenant ON jobs(tenant_id, created_at)")
		.execute(pool)
		.await
		.unwrap();
}

pub async fn create_job_logs_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS job_logs (
			job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
			at TEXT NOT NULL,
			message TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.unwrap();

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_logs_job ON job_logs(job_id)")
		.execute(pool)
		.await
		.unwrap();
}

pub async fn create_job_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_jobs_table(&pool).await;
	create_job_logs_table(&pool).await;
	pool
}
