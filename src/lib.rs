//! cfn-wait - Long-running `CloudFormation` custom resources on AWS Lambda.
//!
//! A custom resource backed by a Lambda function must answer the signed
//! `ResponseURL` exactly once, but a single invocation is capped at a few
//! minutes. This crate turns one lifecycle request into a chain of bounded
//! invocations:
//! - The initiating invocation runs create/update/delete and checks status
//! - While the resource reports it is still working, a continuation is
//!   handed to a [`Scheduler`] which re-invokes the function later
//! - When the resource settles, fails, or the response URL is about to
//!   expire, the terminal SUCCESS/FAILED response is sent once
//!
//! # Example
//!
//! ```ignore
//! use cfn_wait::{CustomResource, ResourceRequest, WaitObservation};
//! use serde_json::Value;
//!
//! struct Cluster;
//!
//! #[async_trait::async_trait]
//! impl CustomResource for Cluster {
//!     async fn create(&self, request: &ResourceRequest) -> anyhow::Result<Value> {
//!         start_cluster(request).await
//!     }
//!
//!     async fn check_status(
//!         &self,
//!         request: &ResourceRequest,
//!         last: Option<Value>,
//!     ) -> anyhow::Result<WaitObservation> {
//!         let state = describe_cluster(request).await?;
//!         Ok(if state.ready() {
//!             WaitObservation::done(Some(state.outputs()))
//!         } else {
//!             WaitObservation::pending(last)
//!         })
//!     }
//!
//!     // update/delete ...
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_runtime::Error> {
//!     lambda_runtime::tracing::init_default_subscriber();
//!     cfn_wait::lambda::serve(Cluster).await
//! }
//! ```

#![forbid(unsafe_code)]

mod callback;
mod config;
mod continuation;
mod error;
mod expiry;
mod hooks;
pub mod lambda;
mod resource;
mod scheduler;
mod transport;
mod types;
mod wait_loop;

pub use callback::{CALLBACK_METHOD, default_reason};
pub use config::{DEFAULT_SAFETY_MARGIN, DEFAULT_WAIT_DELAY, DeletePolicy, WaitConfig};
pub use continuation::{decode, decode_slice, encode};
pub use error::{ExpiryParseError, WaitError};
pub use expiry::{expires_at, is_expired, is_expired_at};
pub use hooks::{DefaultHooks, LoggingHooks, WaitHooks};
pub use resource::{CustomResource, ResourceRequest, perform};
pub use scheduler::{InMemoryScheduler, Scheduler};
pub use transport::{CallbackReceipt, CallbackRequest, CallbackTransport, HttpsTransport};
pub use types::{
    CallbackAddress, CallbackContext, Continuation, InitiatingRequest, InvocationEvent,
    ReinvocationPayload, RequestType, ResponseBody, ResponseStatus, WaitObservation, WaitOutcome,
};
pub use wait_loop::{WaitLoop, WaitLoopBuilder, builder};
