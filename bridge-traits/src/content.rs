//! Remote Content Provider Abstraction
//!
//! A content provider turns a prompt into generated text, or text plus a voice
//! into synthesized speech. The core treats it as a black box that may fail on
//! any call; nothing above this trait retries.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single text generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    /// Model identifier understood by the provider
    pub model: String,
    /// Instructions framing the assistant's role
    pub system_prompt: String,
    /// The prompt itself
    pub user_prompt: String,
    /// Sampling temperature (lower is more deterministic)
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

impl TextRequest {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// Voice settings for speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Speech model identifier
    pub model: String,
    /// Voice name
    pub voice: String,
    /// Optional delivery instructions (tone, pace)
    pub instructions: Option<String>,
}

impl VoiceConfig {
    pub fn new(model: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            voice: voice.into(),
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = if instructions.trim().is_empty() {
            None
        } else {
            Some(instructions)
        };
        self
    }
}

/// A single speech synthesis request. Output is always mp3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub input: String,
    pub voice: VoiceConfig,
}

/// Generative text and speech provider.
///
/// # Errors
///
/// Implementations return [`BridgeError::NotConfigured`](crate::error::BridgeError::NotConfigured)
/// when no credential is available, [`BridgeError::Http`](crate::error::BridgeError::Http)
/// for non-2xx replies, and `OperationFailed` for transport or decoding
/// failures.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::content::{ContentProvider, TextRequest};
///
/// async fn ask(provider: &dyn ContentProvider) -> Result<String> {
///     let request = TextRequest::new("gpt-4-turbo", "You are terse.", "Say hi");
///     provider.generate_text(request).await
/// }
/// ```
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Whether a credential is present. Calls fail fast when this is false.
    fn is_configured(&self) -> bool;

    /// Generate text for the given prompt.
    async fn generate_text(&self, request: TextRequest) -> Result<String>;

    /// Synthesize speech and return the raw audio bytes.
    async fn generate_speech(&self, request: SpeechRequest) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_defaults() {
        let request = TextRequest::new("gpt-4-turbo", "system", "user");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_output_tokens, 500);

        let request = request.with_temperature(0.3).with_max_output_tokens(100);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_output_tokens, 100);
    }

    #[test]
    fn test_blank_instructions_are_dropped() {
        let voice = VoiceConfig::new("gpt-4o-mini-tts", "verse").with_instructions("   ");
        assert_eq!(voice.instructions, None);

        let voice = voice.with_instructions("Speak slowly");
        assert_eq!(voice.instructions.as_deref(), Some("Speak slowly"));
    }
}
