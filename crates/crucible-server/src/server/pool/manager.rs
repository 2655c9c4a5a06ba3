//! Bounded worker pool for blocking compilations.
//!
//! This module defines the [`WorkerPool`] struct, which owns a single
//! bounded FIFO queue of [`CompileTask`]s and exactly N worker tasks
//! draining it. The queue gives explicit backpressure: tasks wait in
//! submission order for a free slot, and the pool size bounds the
//! number of compilations running at once, so an expensive compiler can
//! never starve the front door.
//!
//! Shutdown is coordinated through a shared [`CancellationToken`]: new
//! dispatches are refused, in-flight jobs are drained up to a deadline,
//! then workers are cancelled and joined.

use super::{CompileTask, worker::worker_loop};
use crate::server::compiler::adapter::CompilerAdapter;
use crate::server::service::handler::{jobs_inflight, set_global_shutdown};
use crate::server::store::JobStore;
use core::time::Duration;
use crucible_core::{Error, Result};
use std::sync::Arc;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// A fixed-size pool of asynchronous workers draining a shared FIFO
/// queue of compilation tasks.
pub struct WorkerPool {
    queue_tx: mpsc::Sender<CompileTask>,
    shutdown_token: CancellationToken,
    drain_timeout: Duration,
    handles: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `num_workers` workers sharing one bounded queue of
    /// `queue_depth` slots.
    pub fn new(
        num_workers: usize,
        queue_depth: usize,
        drain_timeout: Duration,
        store: Arc<JobStore>,
        adapter: Arc<CompilerAdapter>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(queue_depth);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let shutdown_token = CancellationToken::new();

        let mut handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            handles.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&queue_rx),
                Arc::clone(&store),
                Arc::clone(&adapter),
                shutdown_token.clone(),
            )));
        }

        Self {
            queue_tx,
            shutdown_token,
            drain_timeout,
            handles: parking_lot::Mutex::new(handles),
        }
    }

    /// Enqueues a task for the next free worker slot, FIFO.
    ///
    /// Suspends only while the queue itself is full; never waits for the
    /// compilation to run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down (`shutdown_token` was cancelled).
    /// - The queue channel is closed.
    pub async fn dispatch(&self, task: CompileTask) -> Result<()> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        self.queue_tx
            .send(task)
            .await
            .map_err(|e| Error::ChannelError {
                context: format!("Work queue closed: {e}"),
            })
    }

    /// Gracefully shuts down the pool.
    ///
    /// - Refuses new submissions.
    /// - Waits (up to the configured drain timeout) for in-flight jobs
    ///   to resolve.
    /// - Cancels the shared [`CancellationToken`] so idle workers exit.
    /// - Waits (up to 3 seconds per worker) for workers to finish.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new requests ===
        tracing::info!("Refusing new submissions");
        set_global_shutdown();

        // === Phase 1: Wait for in-flight jobs to drain ===
        tracing::info!("Draining in-flight jobs ({} active)", jobs_inflight());
        let drain_result = timeout(self.drain_timeout, async {
            while jobs_inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => tracing::debug!("All in-flight jobs drained successfully"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} jobs still active)",
                jobs_inflight()
            ),
        }

        // === Phase 2: Cancel remaining work ===
        tracing::debug!("Cancelling remaining work via shutdown token");
        self.shutdown_token.cancel();

        // === Phase 3: Join workers ===
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        let join_futures = handles.into_iter().enumerate().map(|(i, handle)| async move {
            match timeout(Duration::from_secs(3), handle).await {
                Ok(Ok(())) => tracing::trace!("Worker {i} exited"),
                Ok(Err(e)) => tracing::error!("Worker {i} join error: {e}"),
                Err(_) => tracing::warn!("Worker {i} shutdown timed out"),
            }
        });
        futures::future::join_all(join_futures).await;

        tracing::info!("Worker pool shutdown complete");
    }
}
