//! Scheduling of follow-up invocations.
//!
//! The wait loop never sleeps across the whole wait. Instead it hands a
//! continuation to a [`Scheduler`], which starts a fresh invocation later.
//!
//! # Built-in Implementations
//!
//! - [`InMemoryScheduler`] - Queues payloads for a local driver (testing and
//!   single-process use)
//! - [`crate::lambda::LambdaScheduler`] - Asynchronous AWS Lambda invoke

use crate::types::ReinvocationPayload;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Starts a new invocation carrying the given payload.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Hand the payload off for re-invocation. Fire-and-forget: success means
    /// the hand-off was accepted, not that the next invocation ran.
    ///
    /// # Errors
    /// Returns an error if the hand-off was rejected.
    async fn schedule(&self, payload: &ReinvocationPayload) -> Result<Value>;
}

#[async_trait]
impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    async fn schedule(&self, payload: &ReinvocationPayload) -> Result<Value> {
        (**self).schedule(payload).await
    }
}

/// In-memory implementation of `Scheduler`.
///
/// Payloads are queued in order; a driver pops them and feeds them back into
/// the wait loop.
#[derive(Default)]
pub struct InMemoryScheduler {
    queue: RwLock<VecDeque<ReinvocationPayload>>,
    scheduled: RwLock<usize>,
}

impl InMemoryScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest queued payload.
    ///
    /// # Errors
    /// Returns an error if the queue lock is poisoned.
    pub fn pop(&self) -> Result<Option<ReinvocationPayload>> {
        Ok(self
            .queue
            .write()
            .ok()
            .context("lock poisoned")?
            .pop_front())
    }

    /// Number of payloads waiting to be popped.
    ///
    /// # Errors
    /// Returns an error if the queue lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.queue.read().ok().context("lock poisoned")?.len())
    }

    /// Whether no payloads are waiting.
    ///
    /// # Errors
    /// Returns an error if the queue lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total number of payloads ever scheduled.
    ///
    /// # Errors
    /// Returns an error if the counter lock is poisoned.
    pub fn scheduled_count(&self) -> Result<usize> {
        Ok(*self.scheduled.read().ok().context("lock poisoned")?)
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn schedule(&self, payload: &ReinvocationPayload) -> Result<Value> {
        self.queue
            .write()
            .ok()
            .context("lock poisoned")?
            .push_back(payload.clone());
        let mut scheduled = self.scheduled.write().ok().context("lock poisoned")?;
        *scheduled += 1;
        Ok(json!({ "queued": *scheduled }))
    }
}
