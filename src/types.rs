//! Core types for the wait loop.
//!
//! This module contains the data model shared by every stage of an invocation:
//!
//! - [`RequestType`]: The CloudFormation lifecycle action being performed
//! - [`ResponseBody`]: The orchestrator-facing response record
//! - [`CallbackAddress`]: Parsed destination of the signed response URL
//! - [`CallbackContext`]: Address plus partially-built response body
//! - [`InvocationEvent`]: Either an initiating request or a resumed continuation
//! - [`Continuation`]: Serializable state carried between invocations
//! - [`WaitObservation`]: One status observation from the custom resource
//! - [`WaitOutcome`]: What a single invocation ended up doing

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Lifecycle action requested by CloudFormation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };
        f.write_str(name)
    }
}

/// Terminal status reported to the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Response record sent to the signed response URL.
///
/// `stack_id`, `request_id` and `logical_resource_id` are copied from the
/// initiating event and never change afterwards. `status` and
/// `physical_resource_id` stay unset until the response is finished.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub data: Option<Value>,
}

/// Parsed destination of the orchestrator callback.
///
/// The `path` keeps the query string, which holds the signature and the
/// signed expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAddress {
    pub hostname: String,
    pub port: u16,
    pub path: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
}

/// Everything needed to eventually answer the orchestrator.
///
/// Serialized as the `httpsRequest` object of a continuation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallbackContext {
    #[serde(rename = "options")]
    pub address: CallbackAddress,
    #[serde(rename = "responseBody")]
    pub response_body: ResponseBody,
}

/// State carried from one invocation to the next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    /// Most recent result returned by the status check.
    #[serde(
        rename = "responseData",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub last_observation: Option<Value>,
    #[serde(rename = "httpsRequest")]
    pub callback: CallbackContext,
}

/// Event delivered by CloudFormation to start a resource operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiatingRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub resource_properties: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub old_resource_properties: Option<Value>,
}

/// Payload of a re-invocation scheduled by a previous invocation.
///
/// This is both what the continuation codec produces and what a resumed
/// invocation consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReinvocationPayload {
    pub request_type: RequestType,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub resource_properties: Option<Value>,
    /// Physical id supplied by the initiating event, kept so Update and
    /// Delete chains report the id CloudFormation already knows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "WaitProperties", alias = "Continuation")]
    pub continuation: Continuation,
}

/// A single invocation's input.
///
/// The wire format tells the two apart by the presence of `WaitProperties`;
/// in Rust the distinction is explicit.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvocationEvent {
    /// First invocation, straight from CloudFormation.
    Initiating(InitiatingRequest),
    /// Follow-up invocation carrying a continuation.
    Resumed(ReinvocationPayload),
}

impl InvocationEvent {
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        match self {
            Self::Initiating(request) => request.request_type,
            Self::Resumed(payload) => payload.request_type,
        }
    }

    #[must_use]
    pub const fn is_resumed(&self) -> bool {
        matches!(self, Self::Resumed(_))
    }

    /// Physical id supplied by the event itself, if any.
    #[must_use]
    pub fn physical_resource_id(&self) -> Option<&str> {
        match self {
            Self::Initiating(request) => request.physical_resource_id.as_deref(),
            Self::Resumed(payload) => payload.physical_resource_id.as_deref(),
        }
    }

    /// Request id of the event. Only initiating events carry one; resumed
    /// events keep it inside the carried response body instead.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Initiating(request) => Some(request.request_id.as_str()),
            Self::Resumed(_) => None,
        }
    }

    #[must_use]
    pub fn resource_properties(&self) -> Option<&Value> {
        match self {
            Self::Initiating(request) => request.resource_properties.as_ref(),
            Self::Resumed(payload) => payload.resource_properties.as_ref(),
        }
    }
}

impl<'de> Deserialize<'de> for InvocationEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let resumed = value.get("WaitProperties").is_some() || value.get("Continuation").is_some();

        if resumed {
            serde_json::from_value(value)
                .map(Self::Resumed)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Self::Initiating)
                .map_err(D::Error::custom)
        }
    }
}

/// Result of one status check against the custom resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitObservation {
    pub should_continue: bool,
    pub result: Option<Value>,
}

impl WaitObservation {
    /// The operation has settled; finish with `result`.
    #[must_use]
    pub const fn done(result: Option<Value>) -> Self {
        Self {
            should_continue: false,
            result,
        }
    }

    /// The operation is still running; check again later with `result`.
    #[must_use]
    pub const fn pending(result: Option<Value>) -> Self {
        Self {
            should_continue: true,
            result,
        }
    }
}

/// What a single invocation did.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The terminal response was delivered to the orchestrator.
    Finished { response: ResponseBody },
    /// A continuation was handed to the scheduler; the orchestrator has not
    /// been contacted yet.
    Scheduled { receipt: Value },
}

impl WaitOutcome {
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Response body delivered by a finished invocation.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseBody> {
        match self {
            Self::Finished { response } => Some(response),
            Self::Scheduled { .. } => None,
        }
    }
}

// Keeps an explicit JSON `null` distinct from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_body_uses_pascal_case_and_omits_unset_fields() {
        let body = ResponseBody {
            status: None,
            reason: "See logs".into(),
            physical_resource_id: None,
            stack_id: "stack".into(),
            request_id: "req".into(),
            logical_resource_id: "MyResource".into(),
            data: None,
        };

        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            json!({
                "Reason": "See logs",
                "StackId": "stack",
                "RequestId": "req",
                "LogicalResourceId": "MyResource",
            })
        );
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(ResponseStatus::Success).expect("serialize"),
            json!("SUCCESS")
        );
        assert_eq!(
            serde_json::to_value(ResponseStatus::Failed).expect("serialize"),
            json!("FAILED")
        );
    }

    #[test]
    fn test_initiating_event_deserializes_from_cloudformation_shape() {
        let event: InvocationEvent = serde_json::from_value(json!({
            "RequestType": "Update",
            "ResponseURL": "https://example.com/path?Expires=1",
            "StackId": "stack",
            "RequestId": "req",
            "LogicalResourceId": "MyResource",
            "PhysicalResourceId": "phys-1",
            "ResourceType": "Custom::Thing",
            "ResourceProperties": {"ServiceToken": "arn"},
            "OldResourceProperties": {"ServiceToken": "old"},
        }))
        .expect("deserialize");

        let InvocationEvent::Initiating(request) = event else {
            panic!("expected an initiating event");
        };
        assert_eq!(request.request_type, RequestType::Update);
        assert_eq!(request.physical_resource_id.as_deref(), Some("phys-1"));
        assert_eq!(request.resource_type.as_deref(), Some("Custom::Thing"));
        assert_eq!(
            request.old_resource_properties,
            Some(json!({"ServiceToken": "old"}))
        );
    }

    #[test]
    fn test_event_with_wait_properties_is_resumed() {
        let event: InvocationEvent = serde_json::from_value(json!({
            "RequestType": "Create",
            "WaitProperties": {
                "responseData": {"step": 2},
                "httpsRequest": {
                    "options": {
                        "hostname": "example.com",
                        "port": 443,
                        "path": "/p?Expires=1",
                        "method": "PUT",
                        "headers": {"content-type": ""}
                    },
                    "responseBody": {
                        "Reason": "r",
                        "StackId": "s",
                        "RequestId": "q",
                        "LogicalResourceId": "l"
                    }
                }
            }
        }))
        .expect("deserialize");

        assert!(event.is_resumed());
        assert_eq!(event.request_type(), RequestType::Create);
        assert_eq!(event.request_id(), None);
        let InvocationEvent::Resumed(payload) = event else {
            panic!("expected a resumed event");
        };
        assert_eq!(payload.continuation.last_observation, Some(json!({"step": 2})));
        assert_eq!(payload.continuation.callback.address.port, 443);
    }

    #[test]
    fn test_initiating_event_missing_fields_is_rejected() {
        let result: Result<InvocationEvent, _> = serde_json::from_value(json!({
            "RequestType": "Create",
            "StackId": "stack",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        let result: Result<RequestType, _> = serde_json::from_value(json!("Replace"));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_null_observation_is_preserved() {
        let continuation: Continuation = serde_json::from_value(json!({
            "responseData": null,
            "httpsRequest": {
                "options": {
                    "hostname": "h", "port": 443, "path": "/", "method": "PUT", "headers": {}
                },
                "responseBody": {
                    "Reason": "r", "StackId": "s", "RequestId": "q", "LogicalResourceId": "l"
                }
            }
        }))
        .expect("deserialize");

        assert_eq!(continuation.last_observation, Some(Value::Null));
    }

    #[test]
    fn test_outcome_accessors() {
        let scheduled = WaitOutcome::Scheduled {
            receipt: json!({"StatusCode": 202}),
        };
        assert!(!scheduled.is_finished());
        assert!(scheduled.response().is_none());
    }
}
