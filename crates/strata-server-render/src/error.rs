// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use strata_server_registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
	#[error("Template not found: {0}")]
	TemplateNotFound(String),

	#[error("Template render error: {0}")]
	TemplateRenderError(String),

	#[error("Invalid spec: {0}")]
	InvalidSpec(String),

	#[error("Template I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<RegistryError> for RenderError {
	fn from(e: RegistryError) -> Self {
		RenderError::InvalidSpec(e.to_string())
	}
}

pub type Result<T> = std::result::Result<T, RenderError>;
