// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job status, listing, and cancellation handlers.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use strata_server_db::{Job, JobFilter, JobStatus};
use uuid::Uuid;

use crate::api::{ListJobsResponse, ListQuery};
use crate::error::ServerError;
use crate::routes::tenant_id;
use crate::state::AppState;

/// GET /api/v1/status/{job_id} - full job record including logs.
pub async fn job_status(
	State(state): State<AppState>,
	Path(job_id): Path<Uuid>,
	headers: HeaderMap,
) -> Result<Json<Job>, ServerError> {
	let tenant_id = tenant_id(&headers)?;
	let job = state.engine.get(job_id, &tenant_id).await?;
	Ok(Json(job))
}

/// GET /api/v1/jobs - tenant-scoped job listing with filters.
pub async fn list_jobs(
	State(state): State<AppState>,
	Query(query): Query<ListQuery>,
	headers: HeaderMap,
) -> Result<Json<ListJobsResponse>, ServerError> {
	let tenant_id = tenant_id(&headers)?;
	let status = match query.status.as_deref() {
		Some(raw) => Some(raw.parse::<JobStatus>().map_err(ServerError::BadRequest)?),
		None => None,
	};
	let filter = JobFilter {
		resource_type: query.resource_type,
		status,
		limit: query.limit,
		offset: query.offset,
	};
	let jobs = state.engine.list(&tenant_id, &filter).await?;
	Ok(Json(ListJobsResponse { jobs }))
}

/// POST /api/v1/status/{job_id}/cancel - cancel before the commit step.
pub async fn cancel_job(
	State(state): State<AppState>,
	Path(job_id): Path<Uuid>,
	headers: HeaderMap,
) -> Result<Json<Job>, ServerError> {
	let tenant_id = tenant_id(&headers)?;
	let job = state.engine.cancel(job_id, &tenant_id).await?;
	Ok(Json(job))
}
