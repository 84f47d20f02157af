use crate::error::WaitError;
use crate::hooks::WaitHooks;
use crate::resource::{CustomResource, ResourceRequest};
use crate::scheduler::Scheduler;
use crate::transport::{CallbackReceipt, CallbackRequest, CallbackTransport};
use crate::types::{
    InitiatingRequest, InvocationEvent, ReinvocationPayload, RequestType, ResponseBody,
    WaitObservation,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;

// ===================
// Events
// ===================

/// Signed response URL expiring `expires_in` seconds from now.
pub fn signed_url(expires_in: i64) -> String {
    let expires = OffsetDateTime::now_utc().unix_timestamp() + expires_in;
    format!(
        "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/arn%3Aaws%3Acloudformation%3Aus-east-1%3A123456789012%3Astack/demo/guid%7CMyResource%7Creq-1?AWSAccessKeyId=AKIAEXAMPLE&Expires={expires}&Signature=abc%3D"
    )
}

pub fn initiating_event(request_type: RequestType, response_url: &str) -> InvocationEvent {
    InvocationEvent::Initiating(InitiatingRequest {
        request_type,
        response_url: response_url.to_string(),
        stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/demo/guid".into(),
        request_id: "req-1".into(),
        logical_resource_id: "MyResource".into(),
        physical_resource_id: None,
        resource_type: Some("Custom::Sleepy".into()),
        resource_properties: Some(json!({"ServiceToken": "arn:aws:lambda:fn", "Size": 3})),
        old_resource_properties: None,
    })
}

/// Initiating event whose response URL stays valid for an hour.
pub fn fresh_event(request_type: RequestType) -> InvocationEvent {
    initiating_event(request_type, &signed_url(3600))
}

/// Re-encode a scheduled payload the way the scheduler would deliver it.
pub fn as_wire(payload: &ReinvocationPayload) -> Value {
    serde_json::to_value(payload).expect("payload serializes")
}

// ===================
// Mock Resource
// ===================

/// Resource whose operation result and status checks are scripted.
pub struct ScriptedResource {
    operation: Result<Value, String>,
    statuses: RwLock<VecDeque<Result<WaitObservation, String>>>,
    operation_calls: AtomicUsize,
    status_calls: AtomicUsize,
    seen_last: RwLock<Vec<Option<Value>>>,
}

impl ScriptedResource {
    pub fn new(operation: Value, statuses: Vec<WaitObservation>) -> Self {
        Self {
            operation: Ok(operation),
            statuses: RwLock::new(statuses.into_iter().map(Ok).collect()),
            operation_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            seen_last: RwLock::new(Vec::new()),
        }
    }

    /// Resource whose create/update/delete fails.
    pub fn failing(message: &str) -> Self {
        let mut resource = Self::new(Value::Null, vec![]);
        resource.operation = Err(message.to_string());
        resource
    }

    /// Resource that stays pending `pending` times, then reports `result`.
    pub fn pending_then_done(pending: usize, result: Value) -> Self {
        let mut statuses: Vec<WaitObservation> = (0..pending)
            .map(|step| WaitObservation::pending(Some(json!({ "step": step + 1 }))))
            .collect();
        statuses.push(WaitObservation::done(Some(result)));
        Self::new(json!({ "step": 0 }), statuses)
    }

    /// Append a failing status check to the script.
    pub fn then_fail_status(self, message: &str) -> Self {
        self.statuses
            .write()
            .expect("lock")
            .push_back(Err(message.to_string()));
        self
    }

    pub fn operation_calls(&self) -> usize {
        self.operation_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// `last` values passed to each status check, in order.
    pub fn seen_last(&self) -> Vec<Option<Value>> {
        self.seen_last.read().expect("lock").clone()
    }

    fn run_operation(&self) -> Result<Value> {
        self.operation_calls.fetch_add(1, Ordering::SeqCst);
        match &self.operation {
            Ok(value) => Ok(value.clone()),
            Err(message) => bail!("{message}"),
        }
    }
}

#[async_trait]
impl CustomResource for ScriptedResource {
    async fn create(&self, _request: &ResourceRequest) -> Result<Value> {
        self.run_operation()
    }

    async fn update(&self, _request: &ResourceRequest) -> Result<Value> {
        self.run_operation()
    }

    async fn delete(&self, _request: &ResourceRequest) -> Result<Value> {
        self.run_operation()
    }

    async fn check_status(
        &self,
        _request: &ResourceRequest,
        last: Option<Value>,
    ) -> Result<WaitObservation> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_last.write().expect("lock").push(last);
        let next = self.statuses.write().expect("lock").pop_front();
        match next {
            Some(Ok(observation)) => Ok(observation),
            Some(Err(message)) => bail!("{message}"),
            None => bail!("status script exhausted"),
        }
    }
}

// ===================
// Mock Scheduler
// ===================

/// Scheduler that always rejects the hand-off.
pub struct FailingScheduler;

#[async_trait]
impl Scheduler for FailingScheduler {
    async fn schedule(&self, _payload: &ReinvocationPayload) -> Result<Value> {
        bail!("TooManyRequestsException: Rate Exceeded")
    }
}

// ===================
// Mock Transport
// ===================

/// Transport that records every request instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    requests: RwLock<Vec<CallbackRequest>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            requests: RwLock::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<CallbackRequest> {
        self.requests.read().expect("lock").clone()
    }

    pub fn count(&self) -> usize {
        self.requests.read().expect("lock").len()
    }

    /// Bodies of all delivered responses, parsed.
    pub fn responses(&self) -> Vec<ResponseBody> {
        self.requests()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("response body is JSON"))
            .collect()
    }
}

#[async_trait]
impl CallbackTransport for RecordingTransport {
    async fn send(&self, request: CallbackRequest) -> Result<CallbackReceipt> {
        self.requests.write().expect("lock").push(request);
        if self.fail {
            bail!("connection reset by peer");
        }
        Ok(CallbackReceipt {
            status: 200,
            body: String::new(),
        })
    }
}

// ===================
// Mock Hooks
// ===================

#[derive(Default)]
pub struct RecordingHooks {
    pub invocations: AtomicUsize,
    pub observations: AtomicUsize,
    pub scheduled: AtomicUsize,
    pub finished: AtomicUsize,
    pub errors: RwLock<Vec<WaitError>>,
}

impl RecordingHooks {
    pub fn errors(&self) -> Vec<WaitError> {
        self.errors.read().expect("lock").clone()
    }
}

#[async_trait]
impl WaitHooks for RecordingHooks {
    async fn on_invocation(&self, _event: &InvocationEvent) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_observation(&self, _observation: &WaitObservation) {
        self.observations.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_scheduled(&self, _payload: &ReinvocationPayload, _receipt: &Value) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_finish(&self, _response: &ResponseBody) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_error(&self, error: &WaitError) {
        self.errors.write().expect("lock").push(error.clone());
    }
}
