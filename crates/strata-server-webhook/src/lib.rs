// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Webhook notification delivery with HMAC signing and retries.

pub mod dispatcher;
pub mod error;
pub mod payload;

pub use dispatcher::WebhookDispatcher;
pub use error::{Result, WebhookError};
pub use payload::{WebhookPayload, WebhookStage};
