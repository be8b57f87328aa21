// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, GitOpsConfigLayer, HttpConfigLayer, JobsConfigLayer, LoggingConfigLayer,
	ResourceTypesLayer,
};

/// One partial configuration from a single source. Layers from lower
/// precedence sources are merged under higher ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub gitops: Option<GitOpsConfigLayer>,
	#[serde(default)]
	pub jobs: Option<JobsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub resource_types: Option<ResourceTypesLayer>,
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.gitops, other.gitops, GitOpsConfigLayer::merge);
		merge_section(&mut self.jobs, other.jobs, JobsConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);

		if let Some(types) = other.resource_types {
			let merged = self.resource_types.get_or_insert_with(Default::default);
			for (name, config) in types {
				merged.insert(name, config);
			}
		}
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	if let Some(other) = other {
		match base {
			Some(base) => merge(base, other),
			None => *base = Some(other),
		}
	}
}
