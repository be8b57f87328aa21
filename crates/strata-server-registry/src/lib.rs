// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource type registry for the Strata server.
//!
//! Each resource type carries its repository target, template directory,
//! flavor set, cluster-awareness flag, and webhook policy, plus a closed
//! capability handler (validate / template-context / delete-marker).
//! Reads are lock-free-ish and safe concurrently with the rare
//! registration write; an entry is immutable once registered.

pub mod error;
pub mod handler;
pub mod registry;
pub mod types;

pub use error::{RegistryError, Result};
pub use handler::{builtin_handler, GenericHandler, NamespaceHandler, ResourceHandler, VmHandler};
pub use registry::{default_configs, RegisteredType, ResourceTypeRegistry};
pub use types::{ResourceTypeConfig, WebhookMode, WebhookPolicy, FLAVOR_CUSTOM};
