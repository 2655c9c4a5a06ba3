//! The job store: the single source of truth for job status and results.
//!
//! A concurrency-safe map from job id to [`Job`], guarded by a single
//! `parking_lot::RwLock`. Every mutation is a point insert or a
//! point transition keyed by id, records are never deleted or iterated
//! under concurrent mutation, so one map-level lock held for O(1) work
//! is sufficient.
//!
//! Lifecycle discipline: a job is created `Pending`, transitions exactly
//! once to a terminal state when its worker publishes the outcome, and
//! is never touched again. [`JobStore::resolve`] enforces the
//! exactly-once transition; a second resolution attempt fails with
//! [`Error::AlreadyResolved`] instead of corrupting the record.
//!
//! The store grows monotonically for the life of the process. Eviction
//! is an explicit non-goal.

use crucible_core::{Error, Job, JobOutcome, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh `Pending` job under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if the id already exists. With
    /// 128-bit random ids this signals a broken uniqueness guarantee,
    /// not a normal error path.
    pub fn create(&self, id: &str) -> Result<()> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(id) {
            return Err(Error::DuplicateId { id: id.to_string() });
        }
        jobs.insert(id.to_string(), Job::pending(id));
        Ok(())
    }

    /// Transitions a `Pending` job to its terminal state, attaching the
    /// outcome. Status and outcome are set under the same write lock, so
    /// readers never observe a half-published result.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no job exists under `id`.
    /// - [`Error::AlreadyResolved`] if the job already left `Pending`.
    ///   Exactly one worker resolves each id in correct operation, so
    ///   this indicates a broken lifecycle guarantee.
    pub fn resolve(&self, id: &str, outcome: JobOutcome) -> Result<()> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| Error::NotFound { id: id.to_string() })?;

        if job.status.is_terminal() {
            return Err(Error::AlreadyResolved { id: id.to_string() });
        }

        job.status = outcome.status();
        job.outcome = Some(outcome);
        Ok(())
    }

    /// Read-only lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Job> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    /// Number of jobs ever created (records are never deleted).
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_core::{CompileError, JobStatus};
    use std::sync::Arc;

    fn failed_outcome(msg: &str) -> JobOutcome {
        JobOutcome::Error(CompileError::new(msg))
    }

    #[test]
    fn create_then_get_is_pending() {
        let store = JobStore::new();
        store.create("tmp01").unwrap();

        let job = store.get("tmp01").unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.outcome.is_none());
    }

    #[test]
    fn duplicate_create_fails() {
        let store = JobStore::new();
        store.create("tmp01").unwrap();

        let err = store.create("tmp01").unwrap_err();
        assert!(matches!(err, Error::DuplicateId { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn resolve_publishes_status_and_outcome_together() {
        let store = JobStore::new();
        store.create("tmp01").unwrap();
        store.resolve("tmp01", failed_outcome("bad syntax")).unwrap();

        let job = store.get("tmp01").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(matches!(job.outcome, Some(JobOutcome::Error(ref e)) if e.message == "bad syntax"));
    }

    #[test]
    fn second_resolution_fails_loudly() {
        let store = JobStore::new();
        store.create("tmp01").unwrap();
        store.resolve("tmp01", failed_outcome("first")).unwrap();

        let err = store
            .resolve("tmp01", failed_outcome("second"))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved { .. }));

        // The original outcome is untouched.
        let job = store.get("tmp01").unwrap();
        assert!(matches!(job.outcome, Some(JobOutcome::Error(ref e)) if e.message == "first"));
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let store = JobStore::new();
        let err = store.resolve("tmp99", failed_outcome("x")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn get_unknown_id_fails() {
        let store = JobStore::new();
        let err = store.get("tmp99").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn racing_resolutions_commit_exactly_once() {
        let store = Arc::new(JobStore::new());
        store.create("tmp01").unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .resolve("tmp01", failed_outcome(&format!("writer-{i}")))
                        .is_ok()
                })
            })
            .collect();

        let wins: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(wins, 1);

        let job = store.get("tmp01").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.outcome.is_some());
    }
}
