// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline position of a job. Transitions only ever move forward; the
/// two terminal failure states are reachable from any non-terminal state
/// (`cancelled` only before the commit happens).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Submitted,
	Rendering,
	Committing,
	Notifying,
	Completed,
	Failed,
	Cancelled,
}

impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobStatus::Submitted => "submitted",
			JobStatus::Rendering => "rendering",
			JobStatus::Committing => "committing",
			JobStatus::Notifying => "notifying",
			JobStatus::Completed => "completed",
			JobStatus::Failed => "failed",
			JobStatus::Cancelled => "cancelled",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
		)
	}

	fn rank(&self) -> u8 {
		match self {
			JobStatus::Submitted => 0,
			JobStatus::Rendering => 1,
			JobStatus::Committing => 2,
			JobStatus::Notifying => 3,
			JobStatus::Completed => 4,
			JobStatus::Failed => 4,
			JobStatus::Cancelled => 4,
		}
	}

	/// Whether a transition from `self` to `next` is a forward walk
	/// through the state machine.
	pub fn can_transition_to(&self, next: JobStatus) -> bool {
		if self.is_terminal() {
			return false;
		}
		match next {
			JobStatus::Failed => true,
			JobStatus::Cancelled => matches!(self, JobStatus::Submitted | JobStatus::Rendering),
			_ => next.rank() == self.rank() + 1,
		}
	}
}

impl std::str::FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"submitted" => Ok(JobStatus::Submitted),
			"rendering" => Ok(JobStatus::Rendering),
			"committing" => Ok(JobStatus::Committing),
			"notifying" => Ok(JobStatus::Notifying),
			"completed" => Ok(JobStatus::Completed),
			"failed" => Ok(JobStatus::Failed),
			"cancelled" => Ok(JobStatus::Cancelled),
			_ => Err(format!("unknown job status: {s}")),
		}
	}
}

impl std::fmt::Display for JobStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
	Create,
	Update,
	Delete,
}

impl Operation {
	pub fn as_str(&self) -> &'static str {
		match self {
			Operation::Create => "create",
			Operation::Update => "update",
			Operation::Delete => "delete",
		}
	}
}

impl std::str::FromStr for Operation {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"create" => Ok(Operation::Create),
			"update" => Ok(Operation::Update),
			"delete" => Ok(Operation::Delete),
			_ => Err(format!("unknown operation: {s}")),
		}
	}
}

impl std::fmt::Display for Operation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One timestamped line in a job's append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
	pub at: DateTime<Utc>,
	pub message: String,
}

impl LogEntry {
	pub fn now(message: impl Into<String>) -> Self {
		Self {
			at: Utc::now(),
			message: message.into(),
		}
	}
}

/// A single resource-lifecycle operation tracked end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
	#[serde(rename = "job_id")]
	pub id: Uuid,
	pub tenant_id: String,
	pub cluster_id: Option<String>,
	pub resource_type: String,
	pub resource_name: String,
	pub operation: Operation,
	pub flavor: String,
	pub spec: serde_json::Value,
	pub status: JobStatus,
	pub logs: Vec<LogEntry>,
	pub metadata: serde_json::Map<String, serde_json::Value>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Job {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		tenant_id: String,
		cluster_id: Option<String>,
		resource_type: String,
		resource_name: String,
		operation: Operation,
		flavor: String,
		spec: serde_json::Value,
	) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::new_v4(),
			tenant_id,
			cluster_id,
			resource_type,
			resource_name,
			operation,
			flavor,
			spec,
			status: JobStatus::Submitted,
			logs: Vec::new(),
			metadata: serde_json::Map::new(),
			created_at: now,
			updated_at: now,
		}
	}
}

/// Filters for tenant-scoped job listings.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
	pub resource_type: Option<String>,
	pub status: Option<JobStatus>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_forward_walk() {
		assert!(JobStatus::Submitted.can_transition_to(JobStatus::Rendering));
		assert!(JobStatus::Rendering.can_transition_to(JobStatus::Committing));
		assert!(JobStatus::Committing.can_transition_to(JobStatus::Notifying));
		assert!(JobStatus::Notifying.can_transition_to(JobStatus::Completed));
	}

	#[test]
	fn test_status_never_regresses() {
		assert!(!JobStatus::Committing.can_transition_to(JobStatus::Rendering));
		assert!(!JobStatus::Notifying.can_transition_to(JobStatus::Submitted));
		assert!(!JobStatus::Completed.can_transition_to(JobStatus::Notifying));
	}

	#[test]
	fn test_failed_reachable_from_any_non_terminal() {
		for status in [
			JobStatus::Submitted,
			JobStatus::Rendering,
			JobStatus::Committing,
			JobStatus::Notifying,
		] {
			assert!(status.can_transition_to(JobStatus::Failed));
		}
		assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
		assert!(!JobStatus::Failed.can_transition_to(JobStatus::Failed));
	}

	#[test]
	fn test_cancelled_only_before_commit() {
		assert!(JobStatus::Submitted.can_transition_to(JobStatus::Cancelled));
		assert!(JobStatus::Rendering.can_transition_to(JobStatus::Cancelled));
		assert!(!JobStatus::Committing.can_transition_to(JobStatus::Cancelled));
		assert!(!JobStatus::Notifying.can_transition_to(JobStatus::Cancelled));
	}

	#[test]
	fn test_status_round_trip() {
		for status in [
			JobStatus::Submitted,
			JobStatus::Rendering,
			JobStatus::Committing,
			JobStatus::Notifying,
			JobStatus::Completed,
			JobStatus::Failed,
			JobStatus::Cancelled,
		] {
			assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
		}
	}
}
