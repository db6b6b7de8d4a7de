//! # Core Configuration Module
//!
//! Configuration for the deck content engine.
//!
//! ## Overview
//!
//! A builder produces a [`CoreConfig`] holding the HTTP bridge, the remote
//! provider settings, the language profile that parameterises every prompt,
//! and audio export settings. `build()` validates eagerly so a bad value is
//! reported at startup rather than halfway through a batch.
//!
//! ## Dependencies
//!
//! - `HttpClient` - optional on the builder; the `desktop-shims` feature
//!   injects the reqwest client when none is given.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ProviderConfig};
//!
//! let config = CoreConfig::builder()
//!     .provider(ProviderConfig::default().with_api_key_from_env())
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## API key
//!
//! A missing API key is not a build error. The deck can be loaded and edited
//! without one; the first generation attempt reports a configuration error.

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::fmt;
use std::sync::Arc;

/// Environment variable read by [`ProviderConfig::with_api_key_from_env`].
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_SPEECH_MODEL: &str = "gpt-4o-mini-tts";
pub const DEFAULT_VOICE: &str = "verse";
pub const DEFAULT_ARCHIVE_NAME: &str = "anki-audio.zip";

const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Core configuration. Build with [`CoreConfigBuilder`].
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP bridge used by the remote provider
    pub http_client: Arc<dyn HttpClient>,
    pub provider: ProviderConfig,
    pub language: LanguageProfile,
    pub audio: AudioConfig,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("provider", &self.provider)
            .field("language", &self.language)
            .field("audio", &self.audio)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.language.validate()?;
        self.audio.validate()
    }
}

/// Remote content provider settings (OpenAI-compatible API).
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Secret key; `None` leaves generation disabled
    pub api_key: Option<String>,
    /// API root, without trailing slash
    pub base_url: String,
    pub text_model: String,
    pub speech_model: String,
    /// Default voice for speech synthesis
    pub voice: String,
    /// Optional delivery instructions sent with speech requests
    pub voice_instructions: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            voice_instructions: None,
            request_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("speech_model", &self.speech_model)
            .field("voice", &self.voice)
            .field("voice_instructions", &self.voice_instructions)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Sets the API key. Blank keys are treated as absent.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key.trim().to_string())
        };
        self
    }

    /// Reads the key from `OPENAI_API_KEY`, keeping the current one if unset.
    pub fn with_api_key_from_env(self) -> Self {
        match std::env::var(API_KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => self.with_api_key(key),
            _ => self,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_voice_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.voice_instructions = if instructions.trim().is_empty() {
            None
        } else {
            Some(instructions)
        };
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("Provider base URL cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Provider base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.text_model.trim().is_empty() {
            return Err(Error::Config("Text model cannot be empty".to_string()));
        }
        if self.speech_model.trim().is_empty() {
            return Err(Error::Config("Speech model cannot be empty".to_string()));
        }
        if self.voice.trim().is_empty() {
            return Err(Error::Config("Voice cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than 0 seconds".to_string(),
            ));
        }
        if self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "Request timeout exceeds maximum of {} seconds",
                MAX_REQUEST_TIMEOUT_SECS
            )));
        }
        Ok(())
    }
}

/// The language being studied and the learner's own language.
///
/// Every prompt is phrased from these values. The default profile targets
/// intermediate learners of simplified Chinese who read English.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Name used in prompts ("Chinese language expert", "this Chinese word")
    pub language: String,
    /// Written variety sentences must use
    pub variety: String,
    /// Learner level the sentences should fit
    pub learner_level: String,
    /// Transliteration system name
    pub transliteration: String,
    /// How the transliteration should be written
    pub transliteration_style: String,
    /// Language translations are written in
    pub learner_language: String,
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self {
            language: "Chinese".to_string(),
            variety: "simplified Chinese".to_string(),
            learner_level: "HSK3-HSK4".to_string(),
            transliteration: "pinyin".to_string(),
            transliteration_style: "with tone marks".to_string(),
            learner_language: "English".to_string(),
        }
    }
}

impl LanguageProfile {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("language", &self.language),
            ("variety", &self.variety),
            ("transliteration", &self.transliteration),
            ("learner_language", &self.learner_language),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Language profile field '{}' cannot be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Audio asset naming and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    /// Prepended to generated filenames as `<prefix>_`
    pub filename_prefix: Option<String>,
    /// Suggested name for the exported archive
    pub archive_name: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            filename_prefix: None,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

impl AudioConfig {
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.filename_prefix = if prefix.trim().is_empty() {
            None
        } else {
            Some(prefix)
        };
        self
    }

    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = name.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive_name.trim().is_empty() {
            return Err(Error::Config("Archive name cannot be empty".to_string()));
        }
        if self.archive_name.contains(['/', '\\']) {
            return Err(Error::Config(
                "Archive name must be a file name, not a path".to_string(),
            ));
        }
        if let Some(prefix) = &self.filename_prefix {
            if prefix.contains(['/', '\\', '[', ']']) {
                return Err(Error::Config(format!(
                    "Filename prefix '{}' contains characters not allowed in sound markers",
                    prefix
                )));
            }
        }
        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the content provider. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform HttpClient via .http_client()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(provider: &ProviderConfig) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;
    use std::time::Duration;

    let client = ReqwestHttpClient::with_timeout(Duration::from_secs(
        provider.request_timeout_secs,
    ))
    .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_provider: &ProviderConfig) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    provider: Option<ProviderConfig>,
    api_key: Option<String>,
    language: Option<LanguageProfile>,
    audio: Option<AudioConfig>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest client is used when the `desktop-shims`
    /// feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the whole provider section.
    pub fn provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the API key, overriding any key in [`provider`](Self::provider).
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn language(mut self, language: LanguageProfile) -> Self {
        self.language = Some(language);
        self
    }

    pub fn audio(mut self, audio: AudioConfig) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for invalid values
    /// - [`Error::CapabilityMissing`] when no `HttpClient` was provided and
    ///   no platform default is compiled in
    pub fn build(self) -> Result<CoreConfig> {
        let mut provider = self.provider.unwrap_or_default();
        if let Some(key) = self.api_key {
            provider = provider.with_api_key(key);
        }

        // The default client takes its timeout from the provider section.
        provider.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&provider)?,
        };

        let config = CoreConfig {
            http_client,
            provider,
            language: self.language.unwrap_or_default(),
            audio: self.audio.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder().http_client(Arc::new(NoopHttpClient))
    }

    #[test]
    fn test_build_with_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.text_model, "gpt-4-turbo");
        assert_eq!(config.provider.speech_model, "gpt-4o-mini-tts");
        assert_eq!(config.provider.voice, "verse");
        assert!(!config.provider.has_api_key());
        assert_eq!(config.language.learner_level, "HSK3-HSK4");
        assert_eq!(config.audio.archive_name, "anki-audio.zip");
        assert!(config.audio.filename_prefix.is_none());
    }

    #[test]
    fn test_missing_api_key_is_not_a_build_error() {
        assert!(builder().build().is_ok());
    }

    #[test]
    fn test_api_key_override() {
        let config = builder()
            .provider(ProviderConfig::default().with_api_key("sk-old"))
            .api_key("  sk-new  ")
            .build()
            .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-new"));
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let provider = ProviderConfig::default().with_api_key("   ");
        assert!(!provider.has_api_key());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = ProviderConfig::default().with_api_key("sk-very-secret");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = ProviderConfig::default().with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_invalid_timeout() {
        let result = builder()
            .provider(ProviderConfig::default().with_request_timeout_secs(0))
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("greater than 0")));

        let result = builder()
            .provider(ProviderConfig::default().with_request_timeout_secs(601))
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("maximum")));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = builder()
            .provider(ProviderConfig::default().with_base_url("api.openai.com"))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = builder()
            .provider(ProviderConfig::default().with_text_model(""))
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Text model")));
    }

    #[test]
    fn test_language_profile_validation() {
        let profile = LanguageProfile {
            transliteration: String::new(),
            ..LanguageProfile::default()
        };
        let result = builder().language(profile).build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("transliteration")));
    }

    #[test]
    fn test_audio_config_validation() {
        assert!(AudioConfig::default().with_archive_name("").validate().is_err());
        assert!(AudioConfig::default()
            .with_archive_name("out/anki.zip")
            .validate()
            .is_err());
        assert!(AudioConfig::default()
            .with_filename_prefix("hsk[4]")
            .validate()
            .is_err());
        assert!(AudioConfig::default()
            .with_filename_prefix("hsk4")
            .validate()
            .is_ok());
        assert_eq!(
            AudioConfig::default().with_filename_prefix("  ").filename_prefix,
            None
        );
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_shims() {
        let result = CoreConfig::builder().build();
        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_http_client() {
        assert!(CoreConfig::builder().build().is_ok());
    }
}
