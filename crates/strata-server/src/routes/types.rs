// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource type discovery.

use axum::extract::State;
use axum::Json;

use crate::api::{ResourceTypeInfo, ResourceTypesResponse};
use crate::error::ServerError;
use crate::state::AppState;

/// GET /api/v1/resource-types - the catalog clients can submit against.
pub async fn list_resource_types(
	State(state): State<AppState>,
) -> Result<Json<ResourceTypesResponse>, ServerError> {
	let registry = state.engine.registry();
	let mut resource_types = Vec::new();
	for name in registry.list() {
		let entry = registry.get(&name)?;
		resource_types.push(ResourceTypeInfo::from(&entry.config));
	}
	Ok(Json(ResourceTypesResponse { resource_types }))
}
