// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("Unknown resource type: {0}")]
	UnknownResourceType(String),

	#[error("Duplicate resource type: {0}")]
	DuplicateResourceType(String),

	#[error("Invalid resource type config: {0}")]
	InvalidConfig(String),

	#[error("Invalid spec: {0}")]
	InvalidSpec(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
