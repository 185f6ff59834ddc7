//! Transports carrying `RCall`s to a dispatcher.
//!
//! The protocol needs a single request/response exchange per call, so a
//! transport is one async method. [`HttpTransport`] posts JSON to a URL;
//! [`LocalTransport`] calls an in-process dispatcher and reports errors the
//! same way the HTTP binding does.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use rodcall_protocol::{RCall, RCallResult, RpcError, CONTENT_TYPE as JSON};
use rodcall_server::Dispatcher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("server returned an empty response")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    /// The dispatcher rejected the call.
    #[error("remote error: {0}")]
    Remote(RpcError),

    /// Non-success status without a protocol error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl TransportError {
    /// The protocol error, if the server sent one.
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// Something that can execute an `RCall`.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn call(&self, call: RCall) -> Result<RCallResult, TransportError>;
}

#[async_trait]
impl<T: RemoteService + ?Sized> RemoteService for Arc<T> {
    async fn call(&self, call: RCall) -> Result<RCallResult, TransportError> {
        (**self).call(call).await
    }
}

/// JSON over HTTP POST to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Transport to `url` with a request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(config.url.clone(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteService for HttpTransport {
    async fn call(&self, call: RCall) -> Result<RCallResult, TransportError> {
        let body = serde_json::to_vec(&call)
            .map_err(|e| TransportError::Malformed(format!("failed to encode request: {}", e)))?;
        debug!(url = %self.url, bytes = body.len(), "posting call");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        decode_response(status.as_u16(), &bytes)
    }
}

/// Interpret an HTTP response body.
fn decode_response(status: u16, body: &[u8]) -> Result<RCallResult, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(TransportError::EmptyResponse);
    }
    if (200..300).contains(&status) {
        return serde_json::from_slice(body).map_err(|e| TransportError::Malformed(e.to_string()));
    }
    match serde_json::from_slice::<RpcError>(body) {
        Ok(error) => Err(TransportError::Remote(error)),
        Err(_) => Err(TransportError::Http {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

/// In-process transport.
pub struct LocalTransport<S> {
    dispatcher: Arc<Dispatcher<S>>,
}

impl<S> LocalTransport<S> {
    pub fn new(dispatcher: Arc<Dispatcher<S>>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl<S> RemoteService for LocalTransport<S>
where
    S: Serialize + DeserializeOwned + Send + 'static,
{
    async fn call(&self, call: RCall) -> Result<RCallResult, TransportError> {
        self.dispatcher
            .handle(call)
            .await
            .map_err(|e| TransportError::Remote(e.to_rpc_error()))
    }
}
