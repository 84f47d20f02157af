//! Continuation encoding and decoding.
//!
//! A continuation is the only state that survives between invocations. It is
//! written into the re-invocation payload as:
//!
//! ```json
//! {
//!   "RequestType": "Create",
//!   "ResourceProperties": { ... },
//!   "WaitProperties": {
//!     "responseData": <last observation>,
//!     "httpsRequest": { "options": { ... }, "responseBody": { ... } }
//!   }
//! }
//! ```

use crate::error::WaitError;
use crate::resource::ResourceRequest;
use crate::types::{
    CallbackContext, Continuation, InvocationEvent, ReinvocationPayload, WaitObservation,
};
use serde_json::Value;

/// Build the payload for the next invocation.
#[must_use]
pub fn encode(
    request: &ResourceRequest,
    context: &CallbackContext,
    observation: &WaitObservation,
) -> ReinvocationPayload {
    ReinvocationPayload {
        request_type: request.request_type,
        resource_properties: request.resource_properties.clone(),
        physical_resource_id: request.physical_resource_id.clone(),
        continuation: Continuation {
            last_observation: observation.result.clone(),
            callback: context.clone(),
        },
    }
}

/// Decode an invocation payload.
///
/// Accepts either a JSON object or a JSON string containing one, since some
/// schedulers deliver the payload double-encoded.
///
/// # Errors
/// Returns [`WaitError::InvalidEvent`] if the payload is not a valid
/// initiating or resumed event.
pub fn decode(payload: Value) -> Result<InvocationEvent, WaitError> {
    let payload = match payload {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| WaitError::InvalidEvent(format!("payload string is not JSON: {e}")))?,
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| WaitError::InvalidEvent(e.to_string()))
}

/// Decode an invocation payload from raw bytes.
///
/// # Errors
/// Same as [`decode`].
pub fn decode_slice(bytes: &[u8]) -> Result<InvocationEvent, WaitError> {
    let value = serde_json::from_slice(bytes)
        .map_err(|e| WaitError::InvalidEvent(format!("payload is not JSON: {e}")))?;
    decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallbackAddress, RequestType, ResponseBody};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn context() -> CallbackContext {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), String::new());
        CallbackContext {
            address: CallbackAddress {
                hostname: "bucket.s3.amazonaws.com".into(),
                port: 443,
                path: "/arn%3Aaws?Expires=1700000000&Signature=x".into(),
                method: "PUT".into(),
                headers,
            },
            response_body: ResponseBody {
                status: None,
                reason: "See the details in CloudWatch Log Stream: s".into(),
                physical_resource_id: None,
                stack_id: "stack".into(),
                request_id: "req".into(),
                logical_resource_id: "MyResource".into(),
                data: None,
            },
        }
    }

    fn request(request_type: RequestType, physical: Option<&str>) -> ResourceRequest {
        ResourceRequest {
            request_type,
            stack_id: "stack".into(),
            request_id: "req".into(),
            logical_resource_id: "MyResource".into(),
            physical_resource_id: physical.map(str::to_string),
            resource_type: None,
            resource_properties: Some(json!({"ServiceToken": "arn", "Size": 2})),
            old_resource_properties: None,
            resumed: false,
        }
    }

    fn round_trip(payload: &ReinvocationPayload) -> InvocationEvent {
        let value = serde_json::to_value(payload).expect("serialize");
        decode(value).expect("decode")
    }

    #[test]
    fn test_round_trip_preserves_continuation() {
        let observations = [
            WaitObservation::pending(Some(json!({"JobId": "j-1", "Attempt": 3}))),
            WaitObservation::pending(None),
            WaitObservation::pending(Some(Value::Null)),
            WaitObservation::pending(Some(json!(["a", 1, true]))),
        ];
        let requests = [
            request(RequestType::Create, None),
            request(RequestType::Update, Some("phys-1")),
            request(RequestType::Delete, Some("phys-2")),
        ];

        for request in &requests {
            for observation in &observations {
                let payload = encode(request, &context(), observation);
                assert_eq!(round_trip(&payload), InvocationEvent::Resumed(payload.clone()));

                let InvocationEvent::Resumed(decoded) = round_trip(&payload) else {
                    panic!("expected a resumed event");
                };
                assert_eq!(decoded.continuation.callback, context());
                assert_eq!(decoded.continuation.last_observation, observation.result);
            }
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = encode(
            &request(RequestType::Create, None),
            &context(),
            &WaitObservation::pending(Some(json!({"JobId": "j-1"}))),
        );
        let value = serde_json::to_value(&payload).expect("serialize");

        assert_eq!(value["RequestType"], "Create");
        assert_eq!(value["ResourceProperties"]["Size"], 2);
        assert!(value.get("PhysicalResourceId").is_none());
        assert_eq!(value["WaitProperties"]["responseData"]["JobId"], "j-1");
        assert_eq!(
            value["WaitProperties"]["httpsRequest"]["options"]["method"],
            "PUT"
        );
        assert_eq!(
            value["WaitProperties"]["httpsRequest"]["options"]["headers"]["content-type"],
            ""
        );
        assert_eq!(
            value["WaitProperties"]["httpsRequest"]["responseBody"]["RequestId"],
            "req"
        );
    }

    #[test]
    fn test_decode_double_encoded_payload() {
        let payload = encode(
            &request(RequestType::Update, Some("phys-1")),
            &context(),
            &WaitObservation::pending(Some(json!(7))),
        );
        let raw = serde_json::to_string(&payload).expect("serialize");

        let event = decode(Value::String(raw.clone())).expect("decode string");
        assert_eq!(event, InvocationEvent::Resumed(payload.clone()));

        let event = decode_slice(raw.as_bytes()).expect("decode bytes");
        assert_eq!(event, InvocationEvent::Resumed(payload));
    }

    #[test]
    fn test_decode_accepts_continuation_alias() {
        let payload = encode(
            &request(RequestType::Create, None),
            &context(),
            &WaitObservation::pending(None),
        );
        let mut value = serde_json::to_value(&payload).expect("serialize");
        let continuation = value
            .as_object_mut()
            .and_then(|object| object.remove("WaitProperties"))
            .expect("WaitProperties present");
        value["Continuation"] = continuation;

        assert_eq!(decode(value).ok(), Some(InvocationEvent::Resumed(payload)));
    }

    #[test]
    fn test_decode_initiating_event() {
        let event = decode(json!({
            "RequestType": "Create",
            "ResponseURL": "https://bucket.s3.amazonaws.com/p?Expires=1",
            "StackId": "stack",
            "RequestId": "req",
            "LogicalResourceId": "MyResource",
        }))
        .expect("decode");

        assert!(!event.is_resumed());
        assert_eq!(event.request_id(), Some("req"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode(json!({"Hello": "world"})),
            Err(WaitError::InvalidEvent(_))
        ));
        assert!(matches!(
            decode(Value::String("{not json".into())),
            Err(WaitError::InvalidEvent(_))
        ));
        assert!(matches!(
            decode_slice(b"\x00\x01"),
            Err(WaitError::InvalidEvent(_))
        ));
        assert!(matches!(
            decode(json!({"RequestType": "Create", "WaitProperties": {"responseData": 1}})),
            Err(WaitError::InvalidEvent(_))
        ));
    }
}
