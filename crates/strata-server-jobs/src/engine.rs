// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use strata_server_db::{DbError, Job, JobFilter, JobStatus, JobStore, LogEntry, Operation};
use strata_server_gitops::RepositoryCommitter;
use strata_server_registry::ResourceTypeRegistry;
use strata_server_render::ManifestRenderer;
use strata_server_webhook::WebhookDispatcher;
use tokio::sync::{broadcast, mpsc, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{JobsError, Result};
use crate::pipeline::{self, PipelineDeps};

/// Lanes with no traffic for this long exit and release their task,
/// channel, and join handle. The next submission respawns the lane.
const LANE_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// A validated lifecycle request ready to become a job.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
	pub tenant_id: String,
	pub cluster_id: Option<String>,
	pub resource_type: String,
	pub resource_name: String,
	pub operation: Operation,
	pub flavor: String,
	pub spec: serde_json::Value,
}

/// Accepts lifecycle requests and drives them through the pipeline.
///
/// Jobs that address the same resource are funneled into one lane and
/// executed strictly in submission order; unrelated jobs run
/// concurrently up to the configured cap.
pub struct JobEngine {
	deps: Arc<PipelineDeps>,
	lanes: Mutex<HashMap<String, mpsc::UnboundedSender<Job>>>,
	semaphore: Arc<Semaphore>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobEngine {
	pub fn new(
		store: Arc<dyn JobStore>,
		registry: Arc<ResourceTypeRegistry>,
		renderer: Arc<ManifestRenderer>,
		committer: Arc<dyn RepositoryCommitter>,
		dispatcher: Arc<WebhookDispatcher>,
		config: EngineConfig,
	) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
		Self {
			deps: Arc::new(PipelineDeps {
				store,
				registry,
				renderer,
				committer,
				dispatcher,
				config,
			}),
			lanes: Mutex::new(HashMap::new()),
			semaphore,
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn store(&self) -> &Arc<dyn JobStore> {
		&self.deps.store
	}

	pub fn registry(&self) -> &Arc<ResourceTypeRegistry> {
		&self.deps.registry
	}

	/// Validate a request and enqueue it as a job. Validation failures
	/// are synchronous and leave no job behind.
	#[instrument(skip(self, request), fields(tenant_id = %request.tenant_id, resource_type = %request.resource_type, resource_name = %request.resource_name))]
	pub async fn submit(&self, request: SubmitRequest) -> Result<Job> {
		let entry = self
			.deps
			.registry
			.get(&request.resource_type)
			.map_err(|_| JobsError::UnknownResourceType(request.resource_type.clone()))?;

		if entry.config.cluster_aware && request.cluster_id.is_none() {
			return Err(JobsError::ClusterIdRequired(request.resource_type));
		}
		if !entry.config.cluster_aware && request.cluster_id.is_some() {
			return Err(JobsError::ClusterIdNotAllowed(request.resource_type));
		}
		if !entry.config.is_valid_flavor(&request.flavor) {
			return Err(JobsError::InvalidFlavor {
				resource_type: request.resource_type,
				flavor: request.flavor,
			});
		}
		if request.operation != Operation::Delete {
			entry.handler.validate_spec(&request.resource_name, &request.spec)?;
		}

		let job = Job::new(
			request.tenant_id,
			request.cluster_id,
			request.resource_type,
			request.resource_name,
			request.operation,
			request.flavor,
			request.spec,
		);
		self.deps.store.create(&job).await?;
		self.deps
			.store
			.append_log(
				job.id,
				LogEntry::now(format!(
					"Accepted {} for {}/{}",
					job.operation, job.resource_type, job.resource_name
				)),
			)
			.await?;

		info!(job_id = %job.id, "Job submitted");
		self.enqueue(job.clone()).await?;
		Ok(job)
	}

	pub async fn get(&self, job_id: Uuid, tenant_id: &str) -> Result<Job> {
		Ok(self.deps.store.get(job_id, tenant_id).await?)
	}

	pub async fn list(&self, tenant_id: &str, filter: &JobFilter) -> Result<Vec<Job>> {
		Ok(self.deps.store.list_by_tenant(tenant_id, filter).await?)
	}

	/// Cancel a job that has not reached the commit step. Once the
	/// manifest is being committed the job runs to a terminal status.
	#[instrument(skip(self))]
	pub async fn cancel(&self, job_id: Uuid, tenant_id: &str) -> Result<Job> {
		let job = self.deps.store.get(job_id, tenant_id).await?;
		if !matches!(job.status, JobStatus::Submitted | JobStatus::Rendering) {
			return Err(JobsError::CancelTooLate(job.status));
		}

		match self.deps.store.update_status(job_id, JobStatus::Cancelled, None).await {
			Ok(()) => {}
			Err(DbError::Conflict(_)) => {
				// The worker advanced past rendering before the cancel landed.
				let current = self.deps.store.get(job_id, tenant_id).await?;
				return Err(JobsError::CancelTooLate(current.status));
			}
			Err(err) => return Err(err.into()),
		}
		self.deps
			.store
			.append_log(job_id, LogEntry::now("Job cancelled by request"))
			.await?;
		info!(job_id = %job_id, "Job cancelled");
		Ok(self.deps.store.get(job_id, tenant_id).await?)
	}

	/// Stop accepting work and wait for in-flight jobs to finish.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());
		self.lanes.lock().await.clear();

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}
		info!("Job engine shut down");
	}

	async fn enqueue(&self, job: Job) -> Result<()> {
		let key = lane_key(&job);
		let mut lanes = self.lanes.lock().await;
		lanes.retain(|_, sender| !sender.is_closed());
		if let Some(sender) = lanes.get(&key) {
			if sender.send(job.clone()).is_ok() {
				return Ok(());
			}
			// Lane task exited; replace it.
			lanes.remove(&key);
		}

		let (sender, handle) = self.spawn_lane(&key);
		sender.send(job).map_err(|_| JobsError::ShuttingDown)?;
		lanes.insert(key, sender);

		let mut handles = self.handles.lock().await;
		handles.retain(|h| !h.is_finished());
		handles.push(handle);
		Ok(())
	}

	fn spawn_lane(&self, key: &str) -> (mpsc::UnboundedSender<Job>, JoinHandle<()>) {
		let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
		let deps = Arc::clone(&self.deps);
		let semaphore = Arc::clone(&self.semaphore);
		let mut shutdown_rx = self.shutdown_tx.subscribe();
		let key = key.to_string();

		let handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					maybe_job = receiver.recv() => match maybe_job {
						Some(job) => {
							let permit = match semaphore.acquire().await {
								Ok(permit) => permit,
								Err(_) => break,
							};
							pipeline::run_job(&deps, job).await;
							drop(permit);
						}
						None => break,
					},
					_ = tokio::time::sleep(LANE_IDLE_TIMEOUT) => {
						// Close before draining so a submission that
						// raced the timeout is still executed here
						// rather than dropped.
						receiver.close();
						while let Some(job) = receiver.recv().await {
							let permit = match semaphore.acquire().await {
								Ok(permit) => permit,
								Err(_) => break,
							};
							pipeline::run_job(&deps, job).await;
							drop(permit);
						}
						info!(lane = %key, "Lane idle, exiting");
						break;
					}
					_ = shutdown_rx.recv() => {
						info!(lane = %key, "Lane shutting down");
						break;
					}
				}
			}
		});
		(sender, handle)
	}
}

/// One lane per addressed resource keeps same-resource jobs ordered.
fn lane_key(job: &Job) -> String {
	format!(
		"{}/{}/{}/{}",
		job.tenant_id,
		job.cluster_id.as_deref().unwrap_or("-"),
		job.resource_type,
		job.resource_name
	)
}
