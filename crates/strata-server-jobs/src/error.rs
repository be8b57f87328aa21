// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use strata_server_db::{DbError, JobStatus};
use strata_server_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobsError {
	#[error("unknown resource type: {0}")]
	UnknownResourceType(String),

	#[error("resource type {0} requires a cluster id")]
	ClusterIdRequired(String),

	#[error("resource type {0} does not accept a cluster id")]
	ClusterIdNotAllowed(String),

	#[error("resource type {resource_type} does not offer flavor {flavor}")]
	InvalidFlavor { resource_type: String, flavor: String },

	#[error("invalid spec: {0}")]
	InvalidSpec(String),

	#[error("job can no longer be cancelled (status is {0})")]
	CancelTooLate(JobStatus),

	#[error("engine is shutting down")]
	ShuttingDown,

	#[error(transparent)]
	Db(#[from] DbError),
}

impl From<RegistryError> for JobsError {
	fn from(err: RegistryError) -> Self {
		match err {
			RegistryError::UnknownResourceType(name) => JobsError::UnknownResourceType(name),
			RegistryError::InvalidSpec(message) => JobsError::InvalidSpec(message),
			other => JobsError::InvalidSpec(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, JobsError>;
