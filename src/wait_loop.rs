//! The wait loop state machine.
//!
//! One call to [`WaitLoop::run`] is one bounded invocation:
//!
//! 1. Build the callback context from the event
//! 2. Run the lifecycle operation (initiating invocations only) and observe
//!    its status once
//! 3. Either finish (deliver the response) or, while the response URL stays
//!    valid, hand a continuation to the scheduler and return
//!
//! Every invocation that gets past step 1 does exactly one of "finish" or
//! "schedule". Errors from the resource or the scheduler end the chain with a
//! FAILED response; nothing is retried inside an invocation.

mod builder;
mod finisher;

#[cfg(test)]
mod test_utils;

pub use builder::WaitLoopBuilder;

use crate::config::{DeletePolicy, WaitConfig};
use crate::continuation;
use crate::error::WaitError;
use crate::expiry;
use crate::hooks::WaitHooks;
use crate::resource::{self, CustomResource, ResourceRequest};
use crate::scheduler::Scheduler;
use crate::transport::CallbackTransport;
use crate::types::{
    CallbackContext, InvocationEvent, RequestType, WaitObservation, WaitOutcome,
};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// What the current invocation decided to do.
enum Step {
    Finish(Option<Value>),
    Scheduled(Value),
}

/// Drives a custom resource through the wait protocol, one invocation at a
/// time.
pub struct WaitLoop<R, S, T, H>
where
    R: CustomResource,
    S: Scheduler,
    T: CallbackTransport,
    H: WaitHooks,
{
    resource: Arc<R>,
    scheduler: Arc<S>,
    transport: Arc<T>,
    hooks: Arc<H>,
    config: WaitConfig,
}

/// Create a new builder for constructing a `WaitLoop`.
#[must_use]
pub const fn builder() -> WaitLoopBuilder<(), (), (), ()> {
    WaitLoopBuilder::new()
}

impl<R, S, T, H> WaitLoop<R, S, T, H>
where
    R: CustomResource + 'static,
    S: Scheduler + 'static,
    T: CallbackTransport + 'static,
    H: WaitHooks + 'static,
{
    /// Create a new wait loop with all components specified directly.
    #[must_use]
    pub fn new(resource: R, scheduler: S, transport: T, hooks: H, config: WaitConfig) -> Self {
        Self {
            resource: Arc::new(resource),
            scheduler: Arc::new(scheduler),
            transport: Arc::new(transport),
            hooks: Arc::new(hooks),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Decode a raw invocation payload and run it.
    ///
    /// # Errors
    /// Returns [`WaitError::InvalidEvent`] if the payload cannot be decoded;
    /// no response can be sent in that case. Otherwise see [`WaitLoop::run`].
    pub async fn run_json(&self, payload: Value) -> Result<WaitOutcome, WaitError> {
        let event = match continuation::decode(payload) {
            Ok(event) => event,
            Err(error) => {
                self.hooks.on_error(&error).await;
                return Err(error);
            }
        };
        self.run(event).await
    }

    /// Run one invocation.
    ///
    /// Returns `Finished` once the response has been delivered, or
    /// `Scheduled` when a follow-up invocation will continue the wait.
    ///
    /// # Errors
    /// Returns [`WaitError::InvalidEvent`] if the response URL cannot be
    /// parsed, and [`WaitError::Transport`] if the response could not be
    /// delivered. Operation, expiry and scheduling failures are reported to
    /// the orchestrator and returned as a `Finished` outcome.
    pub async fn run(&self, event: InvocationEvent) -> Result<WaitOutcome, WaitError> {
        self.hooks.on_invocation(&event).await;
        info!(
            "Invocation request_type={} resumed={}",
            event.request_type(),
            event.is_resumed()
        );

        let context = match CallbackContext::from_event(
            &event,
            self.config.log_stream_name.as_deref(),
        ) {
            Ok(context) => context,
            Err(error) => {
                self.hooks.on_error(&error).await;
                return Err(error);
            }
        };
        let request = ResourceRequest::from_event(&event);

        let outcome = match self.step(&event, &request, &context).await {
            Ok(Step::Scheduled(receipt)) => return Ok(WaitOutcome::Scheduled { receipt }),
            Ok(Step::Finish(data)) => {
                finisher::finish(self.transport.as_ref(), &event, context, Ok(data)).await
            }
            Err(error) if error.is_reportable() => {
                warn!("Invocation failed: {error}");
                self.hooks.on_error(&error).await;
                finisher::finish(self.transport.as_ref(), &event, context, Err(&error)).await
            }
            Err(error) => {
                self.hooks.on_error(&error).await;
                return Err(error);
            }
        };

        match outcome {
            Ok(response) => {
                self.hooks.on_finish(&response).await;
                Ok(WaitOutcome::Finished { response })
            }
            Err(error) => {
                self.hooks.on_error(&error).await;
                Err(error)
            }
        }
    }

    async fn step(
        &self,
        event: &InvocationEvent,
        request: &ResourceRequest,
        context: &CallbackContext,
    ) -> Result<Step, WaitError> {
        let observation = match event {
            InvocationEvent::Initiating(_) => {
                let result = resource::perform(self.resource.as_ref(), request)
                    .await
                    .map_err(|e| WaitError::Operation(format!("{e:#}")))?;
                debug!("Operation result {result}");

                if request.request_type == RequestType::Delete
                    && self.config.delete_policy == DeletePolicy::FinishImmediately
                {
                    info!("Delete requests are not waited on, finishing immediately");
                    return Ok(Step::Finish(Some(result)));
                }

                self.check_status(request, Some(result)).await?
            }
            InvocationEvent::Resumed(payload) => {
                self.check_status(request, payload.continuation.last_observation.clone())
                    .await?
            }
        };
        self.hooks.on_observation(&observation).await;

        if !observation.should_continue {
            return Ok(Step::Finish(observation.result));
        }

        info!(
            "Not done waiting yet, rechecking in {}ms",
            self.config.wait_delay.as_millis()
        );
        if !self.config.wait_delay.is_zero() {
            tokio::time::sleep(self.config.wait_delay).await;
        }

        if expiry::is_expired(&context.address, self.config.safety_margin)? {
            return Err(WaitError::Expiry(format!(
                "response URL expires within {}s",
                self.config.safety_margin.as_secs()
            )));
        }

        let payload = continuation::encode(request, context, &observation);
        let receipt = self
            .scheduler
            .schedule(&payload)
            .await
            .map_err(|e| WaitError::Scheduling(format!("{e:#}")))?;
        self.hooks.on_scheduled(&payload, &receipt).await;

        Ok(Step::Scheduled(receipt))
    }

    async fn check_status(
        &self,
        request: &ResourceRequest,
        last: Option<Value>,
    ) -> Result<WaitObservation, WaitError> {
        let observation = self
            .resource
            .check_status(request, last)
            .await
            .map_err(|e| WaitError::Operation(format!("{e:#}")))?;
        debug!(
            "Wait result should_continue={} result={:?}",
            observation.should_continue, observation.result
        );
        Ok(observation)
    }
}
