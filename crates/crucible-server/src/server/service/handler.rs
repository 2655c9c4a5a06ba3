//! Job dispatch and query service.
//!
//! This module defines [`CompileService`], the orchestration layer
//! between the HTTP front door and the job machinery. It owns the job
//! store and the worker pool and implements the submission contract:
//!
//! - validate the request before anything else (an invalid submission
//!   never consumes a job id),
//! - mint a fresh id and create the `Pending` store entry,
//! - enqueue the compile task,
//! - return the id, and only after the store entry exists, so a status
//!   query racing the response can never observe `NotFound`.
//!
//! Compilation itself runs fully decoupled from any caller's connection
//! lifetime; a caller may disconnect and the job still completes and
//! remains retrievable.

use crate::server::compiler::{Compiler, adapter::CompilerAdapter};
use crate::server::config::ServerConfig;
use crate::server::id::mint_job_id;
use crate::server::pool::{CompileTask, manager::WorkerPool};
use crate::server::store::JobStore;
use crucible_core::{CompileError, CompileRequest, Error, JobOutcome, JobStatus, Result};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static JOBS_INFLIGHT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Jobs submitted but not yet resolved (queued or compiling).
pub fn jobs_inflight() -> usize {
    JOBS_INFLIGHT.load(Ordering::Acquire)
}

pub fn increment_jobs_inflight() {
    JOBS_INFLIGHT.fetch_add(1, Ordering::AcqRel);
}

pub fn decrement_jobs_inflight() {
    JOBS_INFLIGHT.fetch_sub(1, Ordering::AcqRel);
}

/// Marks the service as shutting down; subsequent submissions are
/// refused.
pub fn set_global_shutdown() {
    GLOBAL_SHUTDOWN.store(true, Ordering::Release);
}

pub fn is_global_shutdown() -> bool {
    GLOBAL_SHUTDOWN.load(Ordering::Acquire)
}

/// The compilation job service: submission, status and artifact
/// retrieval over a shared store and a bounded worker pool.
#[derive(Clone)]
pub struct CompileService {
    store: Arc<JobStore>,
    worker_pool: Arc<WorkerPool>,
}

impl CompileService {
    /// Creates the service and spawns its worker pool.
    pub fn new(config: &ServerConfig, compiler: Arc<dyn Compiler>) -> Self {
        let store = Arc::new(JobStore::new());
        let adapter = Arc::new(CompilerAdapter::new(compiler));
        let worker_pool = Arc::new(WorkerPool::new(
            config.num_workers,
            config.queue_depth,
            config.drain_timeout,
            Arc::clone(&store),
            adapter,
        ));

        Self { store, worker_pool }
    }

    /// Submits a compilation request and returns its job id.
    ///
    /// Fire-and-forget: the id comes back as soon as the `Pending`
    /// entry exists and the task is queued; the caller polls for the
    /// result.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for a malformed body (no job id is
    ///   consumed).
    /// - [`Error::ServiceShutdown`] once shutdown has begun.
    pub async fn submit(&self, body: &Value) -> Result<String> {
        if is_global_shutdown() {
            return Err(Error::ServiceShutdown);
        }

        let request = CompileRequest::from_value(body)?;
        let job_id = mint_job_id();
        self.store.create(&job_id)?;
        increment_jobs_inflight();

        let (source_id, source_text, sources) = request.into_parts();
        let task = CompileTask {
            job_id: job_id.clone(),
            source_id,
            source_text,
            sources,
        };

        if let Err(e) = self.worker_pool.dispatch(task).await {
            // The id is already visible; resolve it so no caller polls a
            // job that will never run.
            decrement_jobs_inflight();
            tracing::warn!(%job_id, "Failed to enqueue job: {e}");
            let _ = self.store.resolve(
                &job_id,
                JobOutcome::Error(CompileError::new("service is shutting down")),
            );
            return Err(e);
        }

        Ok(job_id)
    }

    /// Current status of a job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn status(&self, job_id: &str) -> Result<JobStatus> {
        Ok(self.store.get(job_id)?.status)
    }

    /// The outcome of a job: `Some` once resolved, `None` while pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn artifact(&self, job_id: &str) -> Result<Option<JobOutcome>> {
        Ok(self.store.get(job_id)?.outcome)
    }

    /// Number of jobs ever tracked by the store (monotonic; records are
    /// never evicted).
    pub fn job_count(&self) -> usize {
        self.store.len()
    }

    /// Initiates a graceful shutdown of the worker pool.
    pub async fn shutdown(&self) {
        self.worker_pool.shutdown().await;
    }
}
