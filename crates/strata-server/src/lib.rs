// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP surface for the Strata resource lifecycle server.
//!
//! Routes lifecycle submissions, job status queries, and resource type
//! discovery onto the job engine. Tenancy comes from the `X-Tenant-ID`
//! header on every tenant-scoped route; jobs belonging to other tenants
//! are indistinguishable from missing ones.

pub mod api;
pub mod error;
pub mod routes;
pub mod state;

pub use error::ServerError;
pub use routes::create_router;
pub use state::{create_app_state, AppState};
