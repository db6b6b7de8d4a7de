//! `HttpClient` over reqwest.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("anki-deck-builder/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-backed client.
///
/// Each request is sent once. Connection failures and timeouts surface as
/// [`BridgeError::OperationFailed`]; any HTTP status is returned unchanged.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map(Self::with_client)
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client unavailable: {}", e)))
    }

    /// Use an already configured reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn to_reqwest(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

fn transport_error(error: reqwest::Error) -> BridgeError {
    let message = if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_connect() {
        format!("Could not connect: {}", error)
    } else {
        error.to_string()
    };
    BridgeError::OperationFailed(message)
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        // The URL never carries credentials; headers are not logged.
        debug!(method = ?request.method, url = %request.url, "Sending request");

        let response = self.to_reqwest(request).send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            transport_error(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;

        debug!(status, bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
