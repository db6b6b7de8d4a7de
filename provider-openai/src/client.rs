//! OpenAI API client
//!
//! Implements [`ContentProvider`] on top of the chat-completions and
//! audio-speech endpoints.
//!
//! ## API Endpoints
//!
//! - **Text**: `POST {base_url}/chat/completions`
//! - **Speech**: `POST {base_url}/audio/speech` (mp3 output)
//!
//! Every call is made exactly once. A non-2xx status becomes
//! [`OpenAiError::Api`] carrying the `error.message` from the body, or the
//! status reason when the body has none.
//!
//! ## Usage
//!
//! ```ignore
//! use provider_openai::OpenAiClient;
//!
//! let client = OpenAiClient::new(http_client, Some("sk-...".to_string()));
//! let text = client
//!     .chat_completion(&TextRequest::new("gpt-4-turbo", "You are terse.", "Say hi"))
//!     .await?;
//! ```

use async_trait::async_trait;
use bridge_traits::content::{ContentProvider, SpeechRequest, TextRequest};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::config::{ProviderConfig, DEFAULT_BASE_URL};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{OpenAiError, Result};
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope, SpeechBody,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI API client
pub struct OpenAiClient {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Creates a client against the public API. A `None` or blank key leaves
    /// the client unconfigured; calls then fail without touching the network.
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a client from the provider section of the core configuration.
    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &ProviderConfig) -> Self {
        Self::new(http_client, config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(OpenAiError::MissingApiKey)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<HttpResponse> {
        let api_key = self.api_key()?;
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint(path))
            .bearer_token(api_key)
            .timeout(self.timeout)
            .json(body)
            .map_err(|e| OpenAiError::ParseError(e.to_string()))?;

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| OpenAiError::Network(e.to_string()))?;

        if !response.is_success() {
            let error = api_error(&response);
            warn!(status = response.status, error = %error, "OpenAI request rejected");
            return Err(error);
        }

        Ok(response)
    }

    /// Runs one chat completion and returns the first choice's content as
    /// sent by the model (untrimmed).
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(&self, request: &TextRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![
                ChatMessage::system(&request.system_prompt),
                ChatMessage::user(&request.user_prompt),
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let response = self.post_json("chat/completions", &body).await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&response.body)
            .map_err(|e| OpenAiError::ParseError(format!("chat completion: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OpenAiError::EmptyResponse)?;

        debug!(chars = content.chars().count(), "Chat completion received");
        Ok(content)
    }

    /// Synthesizes mp3 speech for `request.input`.
    #[instrument(skip(self, request), fields(model = %request.voice.model, voice = %request.voice.voice))]
    pub async fn speech(&self, request: &SpeechRequest) -> Result<Bytes> {
        let body = SpeechBody {
            model: &request.voice.model,
            input: &request.input,
            voice: &request.voice.voice,
            response_format: "mp3",
            instructions: request.voice.instructions.as_deref(),
        };

        let response = self.post_json("audio/speech", &body).await?;
        if response.body.is_empty() {
            return Err(OpenAiError::EmptyResponse);
        }

        debug!(bytes = response.body.len(), "Speech received");
        Ok(response.body)
    }
}

#[async_trait]
impl ContentProvider for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(&self, request: TextRequest) -> BridgeResult<String> {
        Ok(self.chat_completion(&request).await?)
    }

    async fn generate_speech(&self, request: SpeechRequest) -> BridgeResult<Bytes> {
        Ok(self.speech(&request).await?)
    }
}

fn api_error(response: &HttpResponse) -> OpenAiError {
    let message = serde_json::from_slice::<ErrorEnvelope>(&response.body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|body| body.message.filter(|m| !m.is_empty()).or(body.kind))
        .unwrap_or_else(|| status_text(response.status).to_string());

    OpenAiError::Api {
        status: response.status,
        message,
    }
}

/// Reason phrase for the statuses the API documents.
fn status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unexpected Status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::content::VoiceConfig;
    use bridge_traits::error::BridgeError;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn text_request() -> TextRequest {
        TextRequest::new("gpt-4-turbo", "You are a Chinese language expert.", "写一个句子")
            .with_temperature(0.8)
            .with_max_output_tokens(100)
    }

    #[tokio::test]
    async fn test_chat_completion_request_shape() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
                request.method == HttpMethod::Post
                    && request.url == "https://api.openai.com/v1/chat/completions"
                    && request.headers.get("Authorization") == Some(&"Bearer sk-test".to_string())
                    && body["model"] == "gpt-4-turbo"
                    && body["messages"][0]["role"] == "system"
                    && body["messages"][1]["content"] == "写一个句子"
                    && body["max_tokens"] == 100
            })
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"choices":[{"message":{"role":"assistant","content":"我每天学习中文。"}}]}"#,
                ))
            });

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()));
        let text = client.chat_completion(&text_request()).await.unwrap();
        assert_eq!(text, "我每天学习中文。");
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let client = OpenAiClient::new(Arc::new(mock_http), None);
        assert!(!client.is_configured());

        let error = client.generate_text(text_request()).await.unwrap_err();
        assert!(matches!(error, BridgeError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let client = OpenAiClient::new(Arc::new(MockHttpClient::new()), Some("  ".to_string()));
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_error_message_from_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().returning(|_| {
            Ok(response(
                401,
                r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
            ))
        });

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-bad".to_string()));
        let error = client.chat_completion(&text_request()).await.unwrap_err();
        assert_eq!(error.to_string(), "OpenAI API error: Incorrect API key provided");
        assert!(matches!(error, OpenAiError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_error_falls_back_to_status_text() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(503, "<html>upstream down</html>")));

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()));
        let error = client.chat_completion(&text_request()).await.unwrap_err();
        assert_eq!(error.to_string(), "OpenAI API error: Service Unavailable");
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(200, r#"{"choices":[]}"#)));

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()));
        assert!(matches!(
            client.chat_completion(&text_request()).await,
            Err(OpenAiError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(200, "not json")));

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()));
        assert!(matches!(
            client.chat_completion(&text_request()).await,
            Err(OpenAiError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("Request timed out".to_string())));

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()));
        assert!(matches!(
            client.chat_completion(&text_request()).await,
            Err(OpenAiError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_speech_request_and_bytes() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
                request.url == "http://localhost:9000/v1/audio/speech"
                    && body["model"] == "gpt-4o-mini-tts"
                    && body["voice"] == "verse"
                    && body["input"] == "我喜欢吃苹果。"
                    && body["response_format"] == "mp3"
                    && body["instructions"] == "Speak slowly"
            })
            .returning(|_| Ok(response(200, "ID3fake-mp3")));

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()))
            .with_base_url("http://localhost:9000/v1/");
        let request = SpeechRequest {
            input: "我喜欢吃苹果。".to_string(),
            voice: VoiceConfig::new("gpt-4o-mini-tts", "verse").with_instructions("Speak slowly"),
        };
        let audio = client.generate_speech(request).await.unwrap();
        assert_eq!(&audio[..], b"ID3fake-mp3");
    }

    #[tokio::test]
    async fn test_empty_speech_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().returning(|_| Ok(response(200, "")));

        let client = OpenAiClient::new(Arc::new(mock_http), Some("sk-test".to_string()));
        let request = SpeechRequest {
            input: "你好".to_string(),
            voice: VoiceConfig::new("gpt-4o-mini-tts", "verse"),
        };
        assert!(matches!(
            client.speech(&request).await,
            Err(OpenAiError::EmptyResponse)
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ProviderConfig::default()
            .with_api_key("sk-config")
            .with_base_url("https://proxy.example.com/v1")
            .with_request_timeout_secs(15);
        let client = OpenAiClient::from_config(Arc::new(MockHttpClient::new()), &config);
        assert!(client.is_configured());
        assert_eq!(client.endpoint("chat/completions"), "https://proxy.example.com/v1/chat/completions");
        assert_eq!(client.timeout, Duration::from_secs(15));
    }
}
