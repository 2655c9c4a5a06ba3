//! # Job Lifecycle Types
//!
//! A [`Job`] is one asynchronous compilation request and its eventual
//! outcome. Jobs are created `Pending` with no outcome, transition
//! exactly once to `Succeeded` or `Failed` with their outcome attached,
//! and are never mutated again. The store (in `crucible-server`)
//! enforces the exactly-once transition; this module only models it.
//!
//! `Running` is deliberately absent: it is a transient state held
//! inside a worker invocation that no external actor can observe as
//! distinct from `Pending`.

use crate::{Artifact, CompileError};
use serde::Serialize;

/// Terminal-or-pending status of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Wire label used by the status endpoint.
    pub fn as_label(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Succeeded => "SUCCESS",
            JobStatus::Failed => "FAILURE",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// The result a worker publishes for a job: a compiled artifact or a
/// structured diagnostic. A resolved job owns exactly one of these.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Artifact(Box<Artifact>),
    Error(CompileError),
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Artifact(_) => JobStatus::Succeeded,
            JobOutcome::Error(_) => JobStatus::Failed,
        }
    }
}

/// One asynchronous compilation job.
#[derive(Clone, Debug)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub outcome: Option<JobOutcome>,
}

impl Job {
    /// A freshly submitted job: `Pending`, no outcome yet.
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            outcome: None,
        }
    }
}
