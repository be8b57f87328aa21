// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lifecycle submission handlers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use strata_server_db::Operation;
use strata_server_jobs::SubmitRequest;

use crate::api::{SubmitBody, SubmitResponse};
use crate::error::ServerError;
use crate::routes::{cluster_id, tenant_id};
use crate::state::AppState;

/// POST /api/v1/{resource_type}/{operation} - submit a lifecycle request.
///
/// Returns 202 with the job id; progress is tracked via the status
/// endpoints.
pub async fn submit(
	State(state): State<AppState>,
	Path((resource_type, operation)): Path<(String, String)>,
	headers: HeaderMap,
	Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ServerError> {
	let operation: Operation = operation
		.parse()
		.map_err(|_| ServerError::BadRequest(format!("unknown operation: {operation}")))?;
	let tenant_id = tenant_id(&headers)?;
	let cluster_id = cluster_id(&headers)?;

	if body.name.trim().is_empty() {
		return Err(ServerError::BadRequest("resource name must not be empty".to_string()));
	}

	let job = state
		.engine
		.submit(SubmitRequest {
			tenant_id,
			cluster_id,
			resource_type,
			resource_name: body.name,
			operation,
			flavor: body.flavor,
			spec: body.spec,
		})
		.await?;

	Ok((StatusCode::ACCEPTED, Json(SubmitResponse::from(&job))))
}
