//! Error types for the OpenAI provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// OpenAI provider errors
#[derive(Error, Debug)]
pub enum OpenAiError {
    /// No API key was configured
    #[error("OpenAI API key not configured")]
    MissingApiKey,

    /// The API answered with a non-2xx status
    #[error("OpenAI API error: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not what the endpoint documents
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// A 2xx reply without any generated content
    #[error("OpenAI API returned an empty response")]
    EmptyResponse,
}

/// Result type for OpenAI operations
pub type Result<T> = std::result::Result<T, OpenAiError>;

impl From<OpenAiError> for BridgeError {
    fn from(error: OpenAiError) -> Self {
        match error {
            OpenAiError::MissingApiKey => BridgeError::NotConfigured(error.to_string()),
            OpenAiError::Api { status, .. } => BridgeError::Http {
                status,
                message: error.to_string(),
            },
            OpenAiError::Network(_) | OpenAiError::ParseError(_) | OpenAiError::EmptyResponse => {
                BridgeError::OperationFailed(error.to_string())
            }
        }
    }
}
