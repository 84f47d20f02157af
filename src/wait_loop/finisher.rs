//! Final response composition and delivery.

use crate::error::WaitError;
use crate::transport::{CallbackRequest, CallbackTransport};
use crate::types::{CallbackContext, InvocationEvent, ResponseBody, ResponseStatus};
use log::{debug, info};
use serde_json::{Value, json};
use uuid::Uuid;

/// Pick the physical resource id reported to the orchestrator.
///
/// First non-empty wins: the id in the operation's data, the id supplied by
/// the event, the original request id, the id carried in the response body,
/// and finally a fresh UUID. Resumed events keep the original request id in
/// the carried body.
pub(crate) fn resolve_physical_resource_id(
    data: Option<&Value>,
    event: &InvocationEvent,
    carried: &ResponseBody,
) -> String {
    let from_data = data
        .and_then(|d| d.get("PhysicalResourceId"))
        .and_then(Value::as_str);
    let original_request_id = event
        .request_id()
        .unwrap_or(carried.request_id.as_str());

    [
        from_data,
        event.physical_resource_id(),
        Some(original_request_id),
        carried.physical_resource_id.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|id| !id.is_empty())
    .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

/// Fill in the terminal fields of the response body.
pub(crate) fn compose(
    event: &InvocationEvent,
    mut body: ResponseBody,
    outcome: Result<Option<Value>, &WaitError>,
) -> ResponseBody {
    match outcome {
        Ok(data) => {
            let data = data.filter(|d| !d.is_null());
            body.physical_resource_id =
                Some(resolve_physical_resource_id(data.as_ref(), event, &body));
            body.status = Some(ResponseStatus::Success);
            body.data = data;
        }
        Err(error) => {
            body.physical_resource_id = Some(resolve_physical_resource_id(None, event, &body));
            body.status = Some(ResponseStatus::Failed);
            body.reason = format!("{error}. {}", body.reason);
            body.data = Some(json!({ "error": error.to_string() }));
        }
    }
    body
}

/// Build the PUT request for a finished response body.
///
/// # Errors
/// Returns [`WaitError::Transport`] if the body cannot be serialized.
pub(crate) fn callback_request(
    context: &CallbackContext,
    response: &ResponseBody,
) -> Result<CallbackRequest, WaitError> {
    let body = serde_json::to_vec(response)
        .map_err(|e| WaitError::Transport(format!("failed to serialize response: {e}")))?;

    let mut headers = context.address.headers.clone();
    headers.insert("content-length".to_string(), body.len().to_string());

    Ok(CallbackRequest {
        url: context.address.url(),
        method: context.address.method.clone(),
        headers,
        body,
    })
}

/// Compose the response and deliver it.
///
/// Takes the callback context by value: once finished, the context is gone
/// and cannot be used for a second response.
///
/// # Errors
/// Returns [`WaitError::Transport`] if delivery fails.
pub(crate) async fn finish<T>(
    transport: &T,
    event: &InvocationEvent,
    context: CallbackContext,
    outcome: Result<Option<Value>, &WaitError>,
) -> Result<ResponseBody, WaitError>
where
    T: CallbackTransport + ?Sized,
{
    info!("Finish");
    let response = compose(event, context.response_body.clone(), outcome);
    let request = callback_request(&context, &response)?;

    debug!(
        "Response request url={} headers={:?}",
        request.url, request.headers
    );
    debug!("Response body {}", request.body_text());

    let receipt = transport
        .send(request)
        .await
        .map_err(|e| WaitError::Transport(format!("{e:#}")))?;
    debug!("Response receipt status={}", receipt.status);

    Ok(response)
}
