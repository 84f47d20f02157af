//! Callback context construction.
//!
//! An initiating event carries the raw `ResponseURL`; a resumed event carries
//! the already-parsed address and response body. Both end up as a
//! [`CallbackContext`].

use crate::error::WaitError;
use crate::types::{CallbackAddress, CallbackContext, InvocationEvent, ResponseBody};
use std::collections::BTreeMap;
use url::Url;

/// The only method the orchestrator accepts on the response URL.
pub const CALLBACK_METHOD: &str = "PUT";

const HTTPS_PORT: u16 = 443;

impl CallbackAddress {
    /// Parse a signed response URL into a callback address.
    ///
    /// The content type is sent as an empty string, which the pre-signed URL
    /// requires.
    ///
    /// # Errors
    /// Returns [`WaitError::InvalidEvent`] if the URL cannot be parsed or has
    /// no host.
    pub fn from_response_url(response_url: &str) -> Result<Self, WaitError> {
        let url = Url::parse(response_url)
            .map_err(|e| WaitError::InvalidEvent(format!("invalid ResponseURL: {e}")))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| WaitError::InvalidEvent("ResponseURL has no host".into()))?
            .to_string();

        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), String::new());

        Ok(Self {
            hostname,
            port: url.port().unwrap_or(HTTPS_PORT),
            path,
            method: CALLBACK_METHOD.to_string(),
            headers,
        })
    }

    /// Full URL the response is delivered to.
    #[must_use]
    pub fn url(&self) -> String {
        if self.port == HTTPS_PORT {
            format!("https://{}{}", self.hostname, self.path)
        } else {
            format!("https://{}:{}{}", self.hostname, self.port, self.path)
        }
    }
}

impl CallbackContext {
    /// Build the callback context for an invocation.
    ///
    /// Initiating events get a fresh response body whose reason points at the
    /// invocation's log stream. Resumed events return the carried context
    /// unchanged.
    ///
    /// # Errors
    /// Returns [`WaitError::InvalidEvent`] if an initiating event's
    /// `ResponseURL` cannot be parsed.
    pub fn from_event(
        event: &InvocationEvent,
        log_stream_name: Option<&str>,
    ) -> Result<Self, WaitError> {
        match event {
            InvocationEvent::Initiating(request) => {
                let address = CallbackAddress::from_response_url(&request.response_url)?;
                let response_body = ResponseBody {
                    status: None,
                    reason: default_reason(log_stream_name),
                    physical_resource_id: None,
                    stack_id: request.stack_id.clone(),
                    request_id: request.request_id.clone(),
                    logical_resource_id: request.logical_resource_id.clone(),
                    data: None,
                };
                Ok(Self {
                    address,
                    response_body,
                })
            }
            InvocationEvent::Resumed(payload) => Ok(payload.continuation.callback.clone()),
        }
    }
}

/// Reason sent with every response unless a failure provides a better one.
#[must_use]
pub fn default_reason(log_stream_name: Option<&str>) -> String {
    format!(
        "See the details in CloudWatch Log Stream: {}",
        log_stream_name.unwrap_or("unknown")
    )
}
