// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod health;
pub mod lifecycle;
pub mod status;
pub mod types;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health::health_check))
		.route("/api/v1/resource-types", get(types::list_resource_types))
		.route("/api/v1/jobs", get(status::list_jobs))
		.route("/api/v1/status/{job_id}", get(status::job_status))
		.route("/api/v1/status/{job_id}/cancel", post(status::cancel_job))
		.route("/api/v1/{resource_type}/{operation}", post(lifecycle::submit))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

pub(crate) const TENANT_HEADER: &str = "x-tenant-id";
pub(crate) const CLUSTER_HEADER: &str = "x-cluster-id";

/// Pull the mandatory tenant id out of the request headers.
pub(crate) fn tenant_id(headers: &HeaderMap) -> Result<String, ServerError> {
	let value = headers
		.get(TENANT_HEADER)
		.ok_or(ServerError::MissingHeader("X-Tenant-ID"))?;
	let tenant = value
		.to_str()
		.map_err(|_| ServerError::InvalidHeader("X-Tenant-ID"))?
		.trim();
	if tenant.is_empty() {
		return Err(ServerError::MissingHeader("X-Tenant-ID"));
	}
	Ok(tenant.to_string())
}

/// Optional cluster scope; absent and empty are equivalent.
pub(crate) fn cluster_id(headers: &HeaderMap) -> Result<Option<String>, ServerError> {
	match headers.get(CLUSTER_HEADER) {
		None => Ok(None),
		Some(value) => {
			let cluster = value
				.to_str()
				.map_err(|_| ServerError::InvalidHeader("X-Cluster-ID"))?
				.trim();
			if cluster.is_empty() {
				Ok(None)
			} else {
				Ok(Some(cluster.to_string()))
			}
		}
	}
}
