// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use strata_server_config::{DatabaseMode, ServerConfig};
use strata_server_db::{create_pool, run_migrations, JobStore, MemoryJobStore, SqliteJobStore};
use strata_server_gitops::WorktreeCommitter;
use strata_server_jobs::{EngineConfig, JobEngine};
use strata_server_registry::ResourceTypeRegistry;
use strata_server_render::ManifestRenderer;
use strata_server_webhook::WebhookDispatcher;
use tracing::info;

use crate::error::ServerError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<JobEngine>,
}

/// Wire the store, registry, renderer, committer, and dispatcher into a
/// running engine per the resolved configuration.
pub async fn create_app_state(config: &ServerConfig) -> Result<AppState, ServerError> {
	let store: Arc<dyn JobStore> = match config.database.mode {
		DatabaseMode::Memory => {
			info!("using in-memory job store");
			Arc::new(MemoryJobStore::new())
		}
		DatabaseMode::Sqlite => {
			info!(url = %config.database.url, "using sqlite job store");
			let pool = create_pool(&config.database.url).await?;
			run_migrations(&pool).await?;
			Arc::new(SqliteJobStore::new(pool))
		}
	};

	let registry = ResourceTypeRegistry::new();
	for resource_type in &config.resource_types {
		registry.register(resource_type.clone())?;
	}

	let engine = JobEngine::new(
		store,
		Arc::new(registry),
		Arc::new(ManifestRenderer::new(&config.gitops.templates_dir)),
		Arc::new(WorktreeCommitter::new(&config.gitops.worktree_root)),
		Arc::new(WebhookDispatcher::new()),
		EngineConfig {
			max_concurrency: config.jobs.max_concurrency,
			step_timeout: Duration::from_secs(config.jobs.step_timeout_secs),
			max_attempts: config.jobs.max_attempts,
		},
	);

	Ok(AppState {
		engine: Arc::new(engine),
	})
}
