//! # Client Log Buffer
//!
//! Bounded buffer of worker-side log entries, owned by a session and shipped
//! to a [`LogTransport`] in batches. Entries logged before the session knows
//! its worker stay buffered until a worker is configured.
//!
//! The buffer holds at most `buffer_limit` entries; pushing into a full
//! buffer evicts the oldest entry. Error-level entries wake the flush task
//! immediately, everything else waits for the next interval tick.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossbeam::queue::ArrayQueue;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientLogConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientLogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientLogEntry {
    pub level: ClientLogLevel,
    pub message: String,
    /// Where the entry came from, e.g. `console.error` or `unhandled_rejection`
    pub context: Option<String>,
    pub metadata: Option<Value>,
    pub stack: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub worker_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

/// Destination for flushed batches
#[async_trait]
pub trait LogTransport: Send + Sync {
    async fn persist(&self, entries: &[ClientLogEntry]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
struct SessionContext {
    worker_id: Option<Uuid>,
    project_id: Option<Uuid>,
}

pub struct ClientLogBuffer {
    queue: ArrayQueue<ClientLogEntry>,
    context: RwLock<SessionContext>,
    transport: Arc<dyn LogTransport>,
    flushing: AtomicBool,
    flush_interval: Duration,
    wake: Notify,
}

impl ClientLogBuffer {
    pub fn new(config: &ClientLogConfig, transport: Arc<dyn LogTransport>) -> Self {
        Self {
            queue: ArrayQueue::new(config.buffer_limit.max(1)),
            context: RwLock::new(SessionContext::default()),
            transport,
            flushing: AtomicBool::new(false),
            flush_interval: config.flush_interval(),
            wake: Notify::new(),
        }
    }

    /// Attach worker and project context; `None` keeps the current value
    pub fn configure(&self, worker_id: Option<Uuid>, project_id: Option<Uuid>) {
        {
            let mut context = self.context.write();
            context.worker_id = worker_id.or(context.worker_id);
            context.project_id = project_id.or(context.project_id);
        }
        if self.has_worker() && !self.queue.is_empty() {
            self.wake.notify_one();
        }
    }

    pub fn log(
        &self,
        level: ClientLogLevel,
        message: impl Into<String>,
        context: Option<&str>,
        metadata: Option<Value>,
        stack: Option<String>,
    ) {
        let session = *self.context.read();
        let entry = ClientLogEntry {
            level,
            message: message.into(),
            context: context.map(str::to_string),
            metadata,
            stack,
            occurred_at: Utc::now(),
            worker_id: session.worker_id,
            project_id: session.project_id,
        };

        if self.queue.force_push(entry).is_some() {
            debug!("Client log buffer full, dropped oldest entry");
        }

        if level == ClientLogLevel::Error {
            self.wake.notify_one();
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn has_worker(&self) -> bool {
        self.context.read().worker_id.is_some()
    }

    /// Ship the buffered entries. Returns how many were persisted.
    ///
    /// No-op while another flush is running or no worker is configured. On
    /// transport failure the batch goes back into the buffer ahead of
    /// anything logged during the attempt.
    pub async fn flush(&self) -> Result<usize> {
        if self.queue.is_empty() || !self.has_worker() {
            return Ok(0);
        }
        if self.flushing.swap(true, Ordering::SeqCst) {
            return Ok(0);
        }

        let batch = self.drain();
        let result = if batch.is_empty() {
            Ok(0)
        } else {
            match self.transport.persist(&batch).await {
                Ok(()) => Ok(batch.len()),
                Err(e) => {
                    warn!(error = %e, entries = batch.len(), "Failed to persist client logs");
                    self.requeue(batch);
                    Err(e)
                }
            }
        };

        self.flushing.store(false, Ordering::SeqCst);
        result
    }

    fn drain(&self) -> Vec<ClientLogEntry> {
        let mut batch = Vec::with_capacity(self.queue.len());
        while let Some(entry) = self.queue.pop() {
            batch.push(entry);
        }
        batch
    }

    fn requeue(&self, failed: Vec<ClientLogEntry>) {
        let newer = self.drain();
        for entry in failed.into_iter().chain(newer) {
            let _ = self.queue.force_push(entry);
        }
    }

    /// Flush on every interval tick and whenever an error entry is logged,
    /// until `shutdown` flips to true. A final flush runs on shutdown.
    pub fn spawn_flush_task(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.flush_interval);
            info!(interval_ms = self.flush_interval.as_millis() as u64, "Client log flush task started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = self.wake.notified() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                if let Err(e) = self.flush().await {
                    debug!(error = %e, "Client log flush will be retried");
                }
            }

            if let Err(e) = self.flush().await {
                warn!(error = %e, remaining = self.len(), "Final client log flush failed");
            }
            info!("Client log flush task stopped");
        })
    }
}
