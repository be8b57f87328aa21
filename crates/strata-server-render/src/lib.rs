// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Manifest rendering for the Strata server.
//!
//! Resolves a (resource type, flavor) pair to a Jinja-style template under
//! the templates root and renders it against the request spec. Rendering
//! is pure: identical inputs reproduce byte-identical output. Undefined
//! variables are strict errors, so a template's required fields are never
//! silently defaulted.

pub mod error;
pub mod renderer;

pub use error::{RenderError, Result};
pub use renderer::ManifestRenderer;
