// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use strata_server_registry::WebhookPolicy;

use crate::error::{Result, WebhookError};
use crate::payload::WebhookPayload;

type HmacSha256 = Hmac<Sha256>;

/// Signature header, `sha256=<hex>` over the exact request body.
pub const SIGNATURE_HEADER: &str = "X-Strata-Signature-256";
/// Receiver-side deduplication token, one per job and stage.
pub const IDEMPOTENCY_HEADER: &str = "X-Strata-Idempotency-Key";

const USER_AGENT: &str = concat!("strata-webhook/", env!("CARGO_PKG_VERSION"));

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: f64 = 2.0;
const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Delivers webhook notifications with per-attempt timeouts and
/// exponential backoff between attempts.
pub struct WebhookDispatcher {
	client: reqwest::Client,
}

impl WebhookDispatcher {
	pub fn new() -> Self {
		let client = reqwest::Client::builder()
			.user_agent(USER_AGENT)
			.build()
			.expect("reqwest client construction is infallible with these options");
		Self { client }
	}

	/// Deliver `payload` to the endpoint described by `policy`.
	///
	/// The body is serialized once and resent unchanged on every
	/// retry. Network errors and 5xx/429 responses are retried up to
	/// `policy.max_retries` additional attempts; other non-2xx
	/// statuses fail immediately.
	#[tracing::instrument(skip(self, policy, payload), fields(url = %policy.url, key = %payload.idempotency_key()))]
	pub async fn deliver(&self, policy: &WebhookPolicy, payload: &WebhookPayload) -> Result<()> {
		let body = payload.to_body()?;
		let signature = policy
			.secret
			.as_ref()
			.map(|secret| signature_header(secret.as_bytes(), &body));
		let idempotency_key = payload.idempotency_key();
		let timeout = Duration::from_secs(policy.timeout_secs);

		let mut last_status = None;
		for attempt in 0..=policy.max_retries {
			if attempt > 0 {
				tokio::time::sleep(backoff_delay(attempt)).await;
			}

			let mut request = self
				.client
				.post(&policy.url)
				.timeout(timeout)
				.header("content-type", "application/json")
				.header(IDEMPOTENCY_HEADER, &idempotency_key)
				.body(body.clone());
			if let Some(sig) = &signature {
				request = request.header(SIGNATURE_HEADER, sig);
			}

			match request.send().await {
				Ok(response) => {
					let status = response.status();
					if status.is_success() {
						tracing::debug!(attempt, status = status.as_u16(), "webhook delivered");
						return Ok(());
					}
					if status.is_server_error() || status.as_u16() == 429 {
						tracing::warn!(attempt, status = status.as_u16(), "webhook attempt failed, will retry");
						last_status = Some(status.as_u16());
						continue;
					}
					return Err(WebhookError::Status(status.as_u16()));
				}
				Err(err) => {
					tracing::warn!(attempt, error = %err, "webhook attempt failed, will retry");
					last_status = None;
					if attempt == policy.max_retries {
						return Err(WebhookError::Delivery(err));
					}
				}
			}
		}

		match last_status {
			Some(status) => Err(WebhookError::Status(status)),
			None => Err(WebhookError::RetriesExhausted(policy.max_retries + 1)),
		}
	}
}

impl Default for WebhookDispatcher {
	fn default() -> Self {
		Self::new()
	}
}

fn backoff_delay(attempt: u32) -> Duration {
	let delay = BACKOFF_BASE.mul_f64(BACKOFF_FACTOR.powi(attempt as i32 - 1));
	delay.min(BACKOFF_MAX)
}

/// `sha256=<hex>` HMAC over the exact bytes sent on the wire. The
/// value never changes across retries of the same delivery.
fn signature_header(secret: &[u8], body: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
	mac.update(body);
	format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
