//! HTTP Client Abstraction
//!
//! The content provider talks to its API through this trait. Requests are
//! issued exactly once: a failed call is reported to the caller, which decides
//! whether to skip the work item.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Outgoing request. Header names are stored as given.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    /// Overrides the client's default timeout for this request
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| BridgeError::OperationFailed(format!("Could not encode JSON body: {}", e)))?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(Bytes::from(payload)))
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Response as received. Any status, including 4xx/5xx, lands here.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| BridgeError::OperationFailed(format!("Could not decode JSON body: {}", e)))
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async HTTP client.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn ask(client: &dyn HttpClient, body: &Payload) -> Result<Reply> {
///     let request = HttpRequest::post("https://api.openai.com/v1/chat/completions")
///         .bearer_token("sk-...")
///         .json(body)?;
///     client.execute(request).await?.json()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send the request once.
    ///
    /// Non-2xx responses are returned as `Ok`; interpreting the status is the
    /// caller's job.
    ///
    /// # Errors
    ///
    /// `OperationFailed` when no response arrived (connection, TLS, timeout).
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
