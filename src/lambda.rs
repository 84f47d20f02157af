//! AWS Lambda integration.
//!
//! [`LambdaScheduler`] re-invokes the running function asynchronously with a
//! continuation payload, and [`serve`] runs a custom resource as a Lambda
//! handler.
//!
//! # Example
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_runtime::Error> {
//!     lambda_runtime::tracing::init_default_subscriber();
//!     cfn_wait::lambda::serve(MyResource::default()).await
//! }
//! ```

use crate::config::WaitConfig;
use crate::hooks::LoggingHooks;
use crate::resource::CustomResource;
use crate::scheduler::Scheduler;
use crate::transport::HttpsTransport;
use crate::types::ReinvocationPayload;
use crate::wait_loop::WaitLoop;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::{Value, json};
use std::sync::Arc;

/// Schedules continuations by invoking a Lambda function with the `Event`
/// invocation type.
#[derive(Clone)]
pub struct LambdaScheduler {
    client: aws_sdk_lambda::Client,
    function_name: String,
}

impl LambdaScheduler {
    /// Create a scheduler that invokes `function_name` (name or ARN).
    #[must_use]
    pub fn new(client: aws_sdk_lambda::Client, function_name: impl Into<String>) -> Self {
        Self {
            client,
            function_name: function_name.into(),
        }
    }

    /// Create a scheduler using credentials and region from the environment.
    pub async fn from_env(function_name: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(aws_sdk_lambda::Client::new(&config), function_name)
    }

    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }
}

#[async_trait]
impl Scheduler for LambdaScheduler {
    async fn schedule(&self, payload: &ReinvocationPayload) -> Result<Value> {
        let body = serde_json::to_vec(payload).context("Failed to encode continuation")?;

        log::debug!(
            "Invoking function={} bytes={}",
            self.function_name,
            body.len()
        );

        let output = self
            .client
            .invoke()
            .function_name(&self.function_name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(body))
            .send()
            .await
            .context("Failed to invoke continuation")?;

        Ok(json!({ "StatusCode": output.status_code() }))
    }
}

/// Run `resource` as a Lambda handler until the runtime shuts down.
///
/// Each event builds a wait loop that re-invokes the running function for
/// continuations, delivers responses over HTTPS and logs through
/// [`LoggingHooks`]. Configuration comes from [`WaitConfig::from_env`].
///
/// # Errors
/// Returns an error if the Lambda runtime fails.
pub async fn serve<R>(resource: R) -> Result<(), lambda_runtime::Error>
where
    R: CustomResource + 'static,
{
    let resource = Arc::new(resource);
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let client = aws_sdk_lambda::Client::new(&sdk_config);
    let transport = HttpsTransport::new();

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let resource = Arc::clone(&resource);
        let client = client.clone();
        let transport = transport.clone();
        async move { handle(event, resource, client, transport).await }
    }))
    .await
}

async fn handle<R>(
    event: LambdaEvent<Value>,
    resource: Arc<R>,
    client: aws_sdk_lambda::Client,
    transport: HttpsTransport,
) -> Result<Value, lambda_runtime::Error>
where
    R: CustomResource + 'static,
{
    let LambdaEvent { payload, context } = event;
    let config = WaitConfig::from_env()?;
    let scheduler = LambdaScheduler::new(client, context.invoked_function_arn);
    log::debug!(
        "Request id={} continuations target {}",
        context.request_id,
        scheduler.function_name()
    );

    let wait_loop = WaitLoop::new(resource, scheduler, transport, LoggingHooks, config);
    let outcome = wait_loop.run_json(payload).await?;

    Ok(serde_json::to_value(outcome)?)
}
