// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use strata_server_db::{DbError, Job, JobStatus, JobStore, LogEntry, Operation};
use strata_server_gitops::{CommitOutcome, ManifestTarget, RepositoryCommitter};
use strata_server_registry::{RegisteredType, ResourceTypeRegistry, WebhookMode};
use strata_server_render::{ManifestRenderer, RenderError};
use strata_server_webhook::{WebhookDispatcher, WebhookPayload, WebhookStage};
use tracing::{info, warn};

use crate::config::EngineConfig;

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;

/// Everything a lane worker needs to drive a job through the pipeline.
pub(crate) struct PipelineDeps {
	pub store: Arc<dyn JobStore>,
	pub registry: Arc<ResourceTypeRegistry>,
	pub renderer: Arc<ManifestRenderer>,
	pub committer: Arc<dyn RepositoryCommitter>,
	pub dispatcher: Arc<WebhookDispatcher>,
	pub config: EngineConfig,
}

/// Step failures split into retryable and terminal.
enum StepError {
	Transient(String),
	Fatal(String),
}

impl From<strata_server_gitops::GitOpsError> for StepError {
	fn from(err: strata_server_gitops::GitOpsError) -> Self {
		if err.is_transient() {
			StepError::Transient(err.to_string())
		} else {
			StepError::Fatal(err.to_string())
		}
	}
}

impl From<RenderError> for StepError {
	fn from(err: RenderError) -> Self {
		match err {
			RenderError::Io(_) => StepError::Transient(err.to_string()),
			other => StepError::Fatal(other.to_string()),
		}
	}
}

/// Drive one job through render, commit, and notify. Errors are
/// recorded on the job; this never propagates them to the lane.
#[tracing::instrument(skip(deps, job), fields(job_id = %job.id, resource_type = %job.resource_type, resource_name = %job.resource_name))]
pub(crate) async fn run_job(deps: &PipelineDeps, job: Job) {
	let entry = match deps.registry.get(&job.resource_type) {
		Ok(entry) => entry,
		Err(err) => {
			// The type was deregistered between submit and execution.
			mark_failed(deps, &job, err.to_string()).await;
			return;
		}
	};

	if !advance(deps, &job, JobStatus::Rendering, None).await {
		return;
	}
	let manifest = match render_step(deps, &job, &entry).await {
		Ok(manifest) => manifest,
		Err(message) => {
			mark_failed(deps, &job, message).await;
			return;
		}
	};

	if !advance(deps, &job, JobStatus::Committing, None).await {
		return;
	}
	let outcome = match commit_step(deps, &job, &entry, manifest.as_deref()).await {
		Ok(outcome) => outcome,
		Err(message) => {
			mark_failed(deps, &job, message).await;
			return;
		}
	};
	let patch = serde_json::json!({
		"commit_id": outcome.commit_id,
		"manifest_path": outcome.path,
		"commit_message": outcome.message,
	});
	append_log(
		deps,
		&job,
		format!("Committed {} as {}", outcome.path, outcome.commit_id),
	)
	.await;

	if !advance(deps, &job, JobStatus::Notifying, Some(patch)).await {
		return;
	}
	let webhook_failed = match notify_step(deps, &job, &entry, &outcome).await {
		Ok(degraded) => degraded,
		Err(message) => {
			mark_failed(deps, &job, message).await;
			return;
		}
	};

	let patch = webhook_failed.then(|| serde_json::json!({ "webhook_failed": true }));
	if advance(deps, &job, JobStatus::Completed, patch).await {
		info!(job_id = %job.id, "Job completed");
	}
}

/// Advance the job's status, logging the transition. Returns false when
/// the pipeline should stop, which happens when a cancellation won the
/// race on the status row.
async fn advance(
	deps: &PipelineDeps,
	job: &Job,
	status: JobStatus,
	metadata_patch: Option<serde_json::Value>,
) -> bool {
	match deps.store.update_status(job.id, status, metadata_patch).await {
		Ok(()) => {
			append_log(deps, job, format!("Status changed to {status}")).await;
			true
		}
		Err(DbError::Conflict(_)) => {
			match deps.store.get(job.id, &job.tenant_id).await {
				Ok(current) if current.status == JobStatus::Cancelled => {
					info!(job_id = %job.id, "Cancellation observed, stopping pipeline");
				}
				Ok(current) => {
					warn!(job_id = %job.id, status = %current.status, "Unexpected status conflict, stopping pipeline");
				}
				Err(err) => {
					warn!(job_id = %job.id, error = %err, "Failed to re-read job after conflict");
				}
			}
			false
		}
		Err(err) => {
			warn!(job_id = %job.id, error = %err, "Failed to persist status transition");
			false
		}
	}
}

async fn append_log(deps: &PipelineDeps, job: &Job, message: String) {
	if let Err(err) = deps.store.append_log(job.id, LogEntry::now(message)).await {
		warn!(job_id = %job.id, error = %err, "Failed to append job log");
	}
}

async fn mark_failed(deps: &PipelineDeps, job: &Job, message: String) {
	warn!(job_id = %job.id, error = %message, "Job failed");
	append_log(deps, job, format!("Job failed: {message}")).await;
	let patch = serde_json::json!({ "error": message });
	match deps.store.update_status(job.id, JobStatus::Failed, Some(patch)).await {
		Ok(()) | Err(DbError::Conflict(_)) => {}
		Err(err) => warn!(job_id = %job.id, error = %err, "Failed to persist failure"),
	}
}

/// Produce the manifest text for the job, or `None` when the delete
/// path removes the file outright.
async fn render_step(
	deps: &PipelineDeps,
	job: &Job,
	entry: &RegisteredType,
) -> Result<Option<String>, String> {
	if job.operation == Operation::Delete {
		return Ok(entry.handler.delete_marker(&job.resource_name, &job.tenant_id));
	}

	let rendered = retry_step(deps, job, "render", || async {
		deps.renderer
			.render(
				entry,
				&job.flavor,
				&job.resource_name,
				&job.tenant_id,
				job.cluster_id.as_deref(),
				&job.spec,
			)
			.map_err(StepError::from)
	})
	.await?;
	append_log(deps, job, format!("Rendered manifest ({} bytes)", rendered.len())).await;
	Ok(Some(rendered))
}

async fn commit_step(
	deps: &PipelineDeps,
	job: &Job,
	entry: &RegisteredType,
	manifest: Option<&str>,
) -> Result<CommitOutcome, String> {
	let target = ManifestTarget {
		repo_url: entry.config.repo_url.clone(),
		tenant_id: job.tenant_id.clone(),
		cluster_id: job.cluster_id.clone(),
		resource_type: job.resource_type.clone(),
		resource_name: job.resource_name.clone(),
	};

	retry_step(deps, job, "commit", || async {
		let result = match manifest {
			Some(manifest) => deps.committer.commit_manifest(&target, manifest).await,
			None => deps.committer.delete_manifest(&target).await,
		};
		result.map_err(StepError::from)
	})
	.await
}

/// Deliver the configured webhook notifications. Returns `Ok(true)` when
/// a non-mandatory endpoint could not be reached and the job should
/// complete with `webhook_failed` recorded in its metadata.
async fn notify_step(
	deps: &PipelineDeps,
	job: &Job,
	entry: &RegisteredType,
	outcome: &CommitOutcome,
) -> Result<bool, String> {
	let policy = &entry.config.webhook;
	if !policy.enabled {
		return Ok(false);
	}

	let deliveries: Vec<(Option<WebhookStage>, Option<String>)> = match policy.mode {
		WebhookMode::Single => vec![(None, Some(outcome.commit_id.clone()))],
		WebhookMode::Staged => vec![
			(Some(WebhookStage::Rendered), None),
			(Some(WebhookStage::Committed), Some(outcome.commit_id.clone())),
			(None, Some(outcome.commit_id.clone())),
		],
	};

	for (stage, commit_id) in deliveries {
		let payload = WebhookPayload {
			job_id: job.id,
			resource_type: job.resource_type.clone(),
			resource_name: job.resource_name.clone(),
			tenant_id: job.tenant_id.clone(),
			cluster_id: job.cluster_id.clone(),
			status: match stage {
				Some(_) => JobStatus::Notifying.as_str().to_string(),
				None => JobStatus::Completed.as_str().to_string(),
			},
			stage,
			commit_id,
			timestamp: Utc::now(),
		};

		// Delivery is bounded by the policy's own per-attempt timeout
		// and retry cap, not by the pipeline step timeout. Wrapping it
		// again would cut configured retries short.
		match deps.dispatcher.deliver(policy, &payload).await {
			Ok(()) => {}
			Err(err) => {
				if policy.mandatory {
					return Err(format!("webhook delivery failed: {err}"));
				}
				// Best-effort endpoint: record the miss and skip the
				// remaining staged deliveries.
				append_log(deps, job, format!("Webhook delivery failed (non-mandatory): {err}")).await;
				return Ok(true);
			}
		}
	}
	append_log(deps, job, "Webhook notifications delivered".to_string()).await;
	Ok(false)
}

/// Run a pipeline step with a per-attempt timeout and exponential
/// backoff on transient failures.
async fn retry_step<T, F, Fut>(
	deps: &PipelineDeps,
	job: &Job,
	step: &str,
	mut op: F,
) -> Result<T, String>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, StepError>>,
{
	let mut attempt = 0u32;
	loop {
		attempt += 1;
		let result = match tokio::time::timeout(deps.config.step_timeout, op()).await {
			Ok(result) => result,
			Err(_) => Err(StepError::Transient(format!("{step} timed out"))),
		};

		match result {
			Ok(value) => return Ok(value),
			Err(StepError::Fatal(message)) => return Err(message),
			Err(StepError::Transient(message)) => {
				if attempt >= deps.config.max_attempts {
					return Err(format!("{message} (after {attempt} attempts)"));
				}
				let delay_secs = backoff_delay(attempt);
				warn!(job_id = %job.id, step, attempt, delay_secs, error = %message, "Step failed, retrying");
				append_log(
					deps,
					job,
					format!("{step} attempt {attempt} failed: {message}, retrying in {delay_secs}s"),
				)
				.await;
				tokio::time::sleep(Duration::from_secs(delay_secs)).await;
			}
		}
	}
}

pub(crate) fn backoff_delay(retry_count: u32) -> u64 {
	let delay = BASE_RETRY_DELAY_SECS as f64 * RETRY_FACTOR.powi(retry_count as i32 - 1);
	(delay as u64).min(MAX_RETRY_DELAY_SECS)
}
