//! The custom resource contract.
//!
//! A [`CustomResource`] performs the actual provisioning work. The wait loop
//! calls exactly one of `create`/`update`/`delete` on the initiating
//! invocation and then `check_status` once per invocation until the resource
//! reports it is done.

use crate::types::{InvocationEvent, RequestType, WaitObservation};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Request details handed to the custom resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRequest {
    pub request_type: RequestType,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub physical_resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_properties: Option<Value>,
    pub old_resource_properties: Option<Value>,
    /// Whether this invocation resumes an earlier one.
    pub resumed: bool,
}

impl ResourceRequest {
    /// Describe the request carried by an invocation event.
    #[must_use]
    pub fn from_event(event: &InvocationEvent) -> Self {
        match event {
            InvocationEvent::Initiating(request) => Self {
                request_type: request.request_type,
                stack_id: request.stack_id.clone(),
                request_id: request.request_id.clone(),
                logical_resource_id: request.logical_resource_id.clone(),
                physical_resource_id: request.physical_resource_id.clone(),
                resource_type: request.resource_type.clone(),
                resource_properties: request.resource_properties.clone(),
                old_resource_properties: request.old_resource_properties.clone(),
                resumed: false,
            },
            InvocationEvent::Resumed(payload) => {
                let body = &payload.continuation.callback.response_body;
                Self {
                    request_type: payload.request_type,
                    stack_id: body.stack_id.clone(),
                    request_id: body.request_id.clone(),
                    logical_resource_id: body.logical_resource_id.clone(),
                    physical_resource_id: payload.physical_resource_id.clone(),
                    resource_type: None,
                    resource_properties: payload.resource_properties.clone(),
                    old_resource_properties: None,
                    resumed: true,
                }
            }
        }
    }

    /// Look up a resource property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.resource_properties.as_ref()?.get(name)
    }
}

/// A long-running custom resource.
/// Implement this trait to plug provisioning logic into the wait loop.
#[async_trait]
pub trait CustomResource: Send + Sync {
    /// Start creating the resource and return its initial result.
    ///
    /// # Errors
    /// Returns an error if the operation cannot be started.
    async fn create(&self, request: &ResourceRequest) -> Result<Value>;

    /// Start updating the resource and return its initial result.
    ///
    /// # Errors
    /// Returns an error if the operation cannot be started.
    async fn update(&self, request: &ResourceRequest) -> Result<Value>;

    /// Start deleting the resource and return its initial result.
    ///
    /// # Errors
    /// Returns an error if the operation cannot be started.
    async fn delete(&self, request: &ResourceRequest) -> Result<Value>;

    /// Observe the operation's progress.
    ///
    /// `last` is the result of the previous observation (or of the initial
    /// operation on the first check). Return [`WaitObservation::pending`] to
    /// be checked again in a later invocation.
    ///
    /// # Errors
    /// Returns an error if the status cannot be determined; the chain then
    /// ends with a FAILED response.
    async fn check_status(
        &self,
        request: &ResourceRequest,
        last: Option<Value>,
    ) -> Result<WaitObservation> {
        // Default: resources that finish synchronously never wait
        let _ = request;
        Ok(WaitObservation::done(last))
    }
}

#[async_trait]
impl<R: CustomResource + ?Sized> CustomResource for Arc<R> {
    async fn create(&self, request: &ResourceRequest) -> Result<Value> {
        (**self).create(request).await
    }

    async fn update(&self, request: &ResourceRequest) -> Result<Value> {
        (**self).update(request).await
    }

    async fn delete(&self, request: &ResourceRequest) -> Result<Value> {
        (**self).delete(request).await
    }

    async fn check_status(
        &self,
        request: &ResourceRequest,
        last: Option<Value>,
    ) -> Result<WaitObservation> {
        (**self).check_status(request, last).await
    }
}

/// Run the lifecycle operation matching the request type.
///
/// # Errors
/// Propagates the operation's error.
pub async fn perform<R: CustomResource + ?Sized>(
    resource: &R,
    request: &ResourceRequest,
) -> Result<Value> {
    match request.request_type {
        RequestType::Create => resource.create(request).await,
        RequestType::Update => resource.update(request).await,
        RequestType::Delete => resource.delete(request).await,
    }
}
