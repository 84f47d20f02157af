//! Wait loop lifecycle hooks for observability.
//!
//! Hooks let you observe each invocation at key points without the core
//! writing to a process-wide console:
//!
//! - [`WaitHooks::on_invocation`] - An invocation started
//! - [`WaitHooks::on_observation`] - The status check produced an observation
//! - [`WaitHooks::on_scheduled`] - A continuation was handed off
//! - [`WaitHooks::on_finish`] - The response was delivered
//! - [`WaitHooks::on_error`] - Something failed
//!
//! # Built-in Implementations
//!
//! - [`DefaultHooks`] - No-op (default)
//! - [`LoggingHooks`] - Structured `tracing` events for every hook

use crate::error::WaitError;
use crate::types::{InvocationEvent, ReinvocationPayload, ResponseBody, WaitObservation};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Lifecycle hooks for the wait loop.
/// Implement this trait to observe invocations.
#[async_trait]
pub trait WaitHooks: Send + Sync {
    /// Called when an invocation starts, before anything else happens.
    async fn on_invocation(&self, _event: &InvocationEvent) {}

    /// Called with the observation produced by this invocation.
    async fn on_observation(&self, _observation: &WaitObservation) {}

    /// Called after the continuation was accepted by the scheduler.
    async fn on_scheduled(&self, _payload: &ReinvocationPayload, _receipt: &Value) {}

    /// Called after the response was delivered to the orchestrator.
    async fn on_finish(&self, _response: &ResponseBody) {}

    /// Called when an error occurs, including errors that are then reported
    /// to the orchestrator as a FAILED response.
    async fn on_error(&self, _error: &WaitError) {}
}

#[async_trait]
impl<H: WaitHooks + ?Sized> WaitHooks for Arc<H> {
    async fn on_invocation(&self, event: &InvocationEvent) {
        (**self).on_invocation(event).await;
    }

    async fn on_observation(&self, observation: &WaitObservation) {
        (**self).on_observation(observation).await;
    }

    async fn on_scheduled(&self, payload: &ReinvocationPayload, receipt: &Value) {
        (**self).on_scheduled(payload, receipt).await;
    }

    async fn on_finish(&self, response: &ResponseBody) {
        (**self).on_finish(response).await;
    }

    async fn on_error(&self, error: &WaitError) {
        (**self).on_error(error).await;
    }
}

/// Hooks that do nothing.
pub struct DefaultHooks;

#[async_trait]
impl WaitHooks for DefaultHooks {}

/// Hooks that log every lifecycle point (useful in Lambda log streams)
pub struct LoggingHooks;

#[async_trait]
impl WaitHooks for LoggingHooks {
    async fn on_invocation(&self, event: &InvocationEvent) {
        tracing::info!(
            request_type = %event.request_type(),
            resumed = event.is_resumed(),
            "Invocation started"
        );
        tracing::debug!(?event, "Invocation event");
    }

    async fn on_observation(&self, observation: &WaitObservation) {
        tracing::info!(
            should_continue = observation.should_continue,
            result = ?observation.result,
            "Wait result"
        );
    }

    async fn on_scheduled(&self, payload: &ReinvocationPayload, receipt: &Value) {
        tracing::info!(
            request_type = %payload.request_type,
            %receipt,
            "Not done waiting yet, scheduled another check"
        );
    }

    async fn on_finish(&self, response: &ResponseBody) {
        tracing::info!(
            status = ?response.status,
            physical_resource_id = ?response.physical_resource_id,
            "Response delivered"
        );
    }

    async fn on_error(&self, error: &WaitError) {
        tracing::error!(%error, "Wait loop error");
    }
}
