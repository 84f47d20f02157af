//! A custom resource that takes several invocations to settle.
//!
//! Each status check counts down the `Checks` property (default 3), so the
//! resource only reports done after that many continuations. Useful for
//! exercising the wait loop end to end in a real stack.
//!
//! # Running
//!
//! ```bash
//! cargo lambda build --release --example sleepy_resource
//! ```
//!
//! Then reference the function as the `ServiceToken` of a `Custom::Sleepy`
//! resource. Set `CFN_WAIT_DELAY_SECS` to shorten the pause between checks.

use anyhow::Result;
use async_trait::async_trait;
use cfn_wait::{CustomResource, ResourceRequest, WaitObservation};
use serde_json::{Value, json};

const DEFAULT_CHECKS: u64 = 3;

struct SleepyResource;

impl SleepyResource {
    fn checks(request: &ResourceRequest) -> u64 {
        request
            .property("Checks")
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
            .unwrap_or(DEFAULT_CHECKS)
    }
}

#[async_trait]
impl CustomResource for SleepyResource {
    async fn create(&self, request: &ResourceRequest) -> Result<Value> {
        Ok(json!({ "Remaining": Self::checks(request) }))
    }

    async fn update(&self, request: &ResourceRequest) -> Result<Value> {
        Ok(json!({ "Remaining": Self::checks(request) }))
    }

    async fn delete(&self, _request: &ResourceRequest) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn check_status(
        &self,
        request: &ResourceRequest,
        last: Option<Value>,
    ) -> Result<WaitObservation> {
        let remaining = last
            .as_ref()
            .and_then(|v| v.get("Remaining"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        if remaining == 0 {
            log::info!("{} is awake", request.logical_resource_id);
            return Ok(WaitObservation::done(Some(json!({
                "PhysicalResourceId": format!("sleepy-{}", request.request_id),
                "Checks": Self::checks(request),
            }))));
        }

        log::info!("{} still sleeping, {remaining} checks left", request.logical_resource_id);
        Ok(WaitObservation::pending(Some(json!({ "Remaining": remaining - 1 }))))
    }
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lambda_runtime::tracing::init_default_subscriber();
    cfn_wait::lambda::serve(SleepyResource).await
}
