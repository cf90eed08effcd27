// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size worker pool
//!
//! Workers share one bounded queue. `submit` waits for room in the queue,
//! so a full pool pushes back on its callers. Closing stops the workers once
//! their current task finishes; tasks still queued are dropped.

use crate::error::ChannelError;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

type Queue = Arc<TokioMutex<mpsc::Receiver<Task>>>;

/// Runs submitted tasks on `workers` background tasks
pub struct TaskPool {
    tasks: mpsc::Sender<Task>,
    stop: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskPool {
    /// Start `workers` workers behind a queue of `capacity` tasks
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(workers: usize, capacity: usize) -> Result<Self, ChannelError> {
        if workers == 0 {
            return Err(ChannelError::ZeroWorkers);
        }
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }

        let (tx, rx) = mpsc::channel(capacity);
        let queue: Queue = Arc::new(TokioMutex::new(rx));
        let stop = CancellationToken::new();
        let handles = (0..workers)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&queue), stop.clone())))
            .collect();
        tracing::debug!(workers, capacity, "task pool started");

        Ok(Self {
            tasks: tx,
            stop,
            workers: Mutex::new(handles),
        })
    }

    /// Queue `task`, waiting for room until `cancel` fires
    pub async fn submit<F>(&self, cancel: &CancellationToken, task: F) -> Result<(), ChannelError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.stop.is_cancelled() {
            return Err(ChannelError::Closed);
        }
        let task: Task = Box::pin(task);
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(ChannelError::Closed),
            _ = cancel.cancelled() => Err(ChannelError::Cancelled),
            sent = self.tasks.send(task) => sent.map_err(|_| ChannelError::Closed),
        }
    }

    /// Tasks waiting for a worker
    pub fn queued(&self) -> usize {
        self.tasks.max_capacity() - self.tasks.capacity()
    }

    /// Stop the workers
    pub fn close(&self) -> Result<(), ChannelError> {
        if self.stop.is_cancelled() {
            return Err(ChannelError::Closed);
        }
        self.stop.cancel();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Wait for every worker to exit
    ///
    /// Only returns after [`close`](Self::close).
    pub async fn join(&self) {
        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "worker ended abnormally");
            }
        }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

async fn worker_loop(id: usize, queue: Queue, stop: CancellationToken) {
    loop {
        let next = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            next = async { queue.lock().await.recv().await } => next,
        };
        let Some(task) = next else {
            break;
        };
        // A panicking task takes down its own task, not the worker
        if let Err(e) = tokio::spawn(task).await {
            tracing::warn!(worker = id, error = %e, "task failed");
        }
    }
    tracing::debug!(worker = id, "worker stopped");
}

#[cfg(test)]
#[path = "task_pool_tests.rs"]
mod tests;
