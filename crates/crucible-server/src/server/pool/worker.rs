//! Worker task: pull a task, compile, publish.
//!
//! Each worker repeatedly takes the next [`CompileTask`] from the
//! shared queue (the receiver mutex is held only across the take, so
//! queue order is preserved and free workers pick up immediately), runs
//! the blocking adapter call on the blocking thread pool, and publishes
//! the outcome into the store. A task that has started always runs to
//! completion; cancellation only stops idle workers from taking more
//! work.

use super::CompileTask;
use crate::server::compiler::adapter::CompilerAdapter;
use crate::server::service::handler::decrement_jobs_inflight;
use crate::server::store::JobStore;
use crucible_core::{CompileError, JobOutcome};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

pub async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<CompileTask>>>,
    store: Arc<JobStore>,
    adapter: Arc<CompilerAdapter>,
    shutdown_token: CancellationToken,
) {
    tracing::trace!("Worker {worker_id} started");

    loop {
        let task = {
            let mut rx = queue.lock().await;
            tokio::select! {
                () = shutdown_token.cancelled() => None,
                task = rx.recv() => task,
            }
        };
        let Some(task) = task else { break };

        tracing::debug!(job_id = %task.job_id, source_id = %task.source_id,
            "Worker {worker_id} picked up job");

        let CompileTask {
            job_id,
            source_id,
            source_text,
            sources,
        } = task;

        // The compile call is synchronous and CPU-heavy; hand it to the
        // blocking pool so this runtime thread stays responsive.
        let worker_adapter = Arc::clone(&adapter);
        let outcome = {
            let source_id = source_id.clone();
            tokio::task::spawn_blocking(move || {
                worker_adapter.run(&source_id, &source_text, sources)
            })
            .await
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                // spawn_blocking only fails on panic or runtime
                // shutdown; the adapter already contains panics, so
                // this is a last-resort fallback.
                tracing::error!(%job_id, "Worker {worker_id} lost compile task: {e}");
                JobOutcome::Error(CompileError::new("internal compiler error"))
            }
        };

        tracing::debug!(%job_id, status = outcome.status().as_label(),
            "Worker {worker_id} resolved job");

        if let Err(e) = store.resolve(&job_id, outcome) {
            // Exactly one worker resolves each id; reaching this means a
            // uniqueness or lifecycle guarantee broke upstream.
            tracing::error!(%job_id, "Invariant violation while resolving job: {e}");
        }
        decrement_jobs_inflight();
    }

    tracing::trace!("Worker {worker_id} stopped");
}
