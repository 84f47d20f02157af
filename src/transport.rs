//! Delivery of the response to the orchestrator.

use crate::callback::CALLBACK_METHOD;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully prepared response delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl CallbackRequest {
    /// Body as text, for logging.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// What the orchestrator's endpoint answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackReceipt {
    pub status: u16,
    pub body: String,
}

/// Sends the response to the signed URL.
#[async_trait]
pub trait CallbackTransport: Send + Sync {
    /// Deliver the response exactly once.
    ///
    /// # Errors
    /// Returns an error if the request fails or is rejected.
    async fn send(&self, request: CallbackRequest) -> Result<CallbackReceipt>;
}

#[async_trait]
impl<T: CallbackTransport + ?Sized> CallbackTransport for Arc<T> {
    async fn send(&self, request: CallbackRequest) -> Result<CallbackReceipt> {
        (**self).send(request).await
    }
}

/// HTTPS transport backed by reqwest.
#[derive(Clone)]
pub struct HttpsTransport {
    client: reqwest::Client,
}

impl Default for HttpsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpsTransport {
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Create with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallbackTransport for HttpsTransport {
    async fn send(&self, request: CallbackRequest) -> Result<CallbackReceipt> {
        if !request.method.eq_ignore_ascii_case(CALLBACK_METHOD) {
            bail!(
                "response URL only accepts {CALLBACK_METHOD}, got {}",
                request.method
            );
        }

        let mut builder = self.client.put(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .context("Failed to send response")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            log::error!("Response rejected status={status} body={body}");
            bail!("response rejected with status {status}: {body}");
        }

        log::debug!("Response accepted status={status}");
        Ok(CallbackReceipt {
            status: status.as_u16(),
            body,
        })
    }
}
