// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod database;
pub mod gitops;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod resource_types;

pub use database::{DatabaseConfig, DatabaseConfigLayer, DatabaseMode};
pub use gitops::{GitOpsConfig, GitOpsConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use jobs::{JobsConfig, JobsConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use resource_types::{finalize_resource_types, ResourceTypesLayer};
