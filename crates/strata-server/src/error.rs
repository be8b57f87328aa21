// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use strata_server_db::DbError;
use strata_server_jobs::JobsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("missing required header {0}")]
	MissingHeader(&'static str),

	#[error("invalid value for {0}")]
	InvalidHeader(&'static str),

	#[error("invalid request: {0}")]
	BadRequest(String),

	#[error(transparent)]
	Jobs(#[from] JobsError),

	#[error(transparent)]
	Db(#[from] DbError),

	#[error(transparent)]
	Config(#[from] strata_server_config::ConfigError),

	#[error(transparent)]
	Registry(#[from] strata_server_registry::RegistryError),
}

/// Wire shape for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
	pub error: &'static str,
	pub message: String,
}

impl ServerError {
	fn status_and_code(&self) -> (StatusCode, &'static str) {
		match self {
			ServerError::MissingHeader(_) | ServerError::InvalidHeader(_) | ServerError::BadRequest(_) => {
				(StatusCode::BAD_REQUEST, "bad_request")
			}
			ServerError::Jobs(err) => match err {
				JobsError::UnknownResourceType(_) => (StatusCode::NOT_FOUND, "unknown_resource_type"),
				JobsError::ClusterIdRequired(_)
				| JobsError::ClusterIdNotAllowed(_)
				| JobsError::InvalidFlavor { .. }
				| JobsError::InvalidSpec(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
				JobsError::CancelTooLate(_) => (StatusCode::CONFLICT, "conflict"),
				JobsError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
				JobsError::Db(db) => db_status(db),
			},
			ServerError::Db(db) => db_status(db),
			ServerError::Config(_) | ServerError::Registry(_) => {
				(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
			}
		}
	}
}

/// Cross-tenant access reads as not-found so job ids leak nothing.
fn db_status(err: &DbError) -> (StatusCode, &'static str) {
	match err {
		DbError::NotFound(_) | DbError::Forbidden => (StatusCode::NOT_FOUND, "not_found"),
		DbError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
		_ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, code) = self.status_and_code();
		let message = match status {
			// Hide internals behind a generic message.
			StatusCode::INTERNAL_SERVER_ERROR => "internal server error".to_string(),
			_ => self.to_string(),
		};
		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}
		(status, Json(ErrorBody { error: code, message })).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_forbidden_reads_as_not_found() {
		let (status, code) = ServerError::Db(DbError::Forbidden).status_and_code();
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(code, "not_found");
	}

	#[test]
	fn test_cancel_too_late_is_conflict() {
		let err = ServerError::Jobs(JobsError::CancelTooLate(strata_server_db::JobStatus::Completed));
		let (status, _) = err.status_and_code();
		assert_eq!(status, StatusCode::CONFLICT);
	}
}
