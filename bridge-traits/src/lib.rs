//! # Host Bridge Traits
//!
//! Capability traits the deck core needs from its host.
//!
//! ## Overview
//!
//! The core never talks to the network or the host logger directly. It goes
//! through the traits below so a desktop build can plug in `reqwest`, a test
//! can plug in a scripted fake, and a host UI can capture logs.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//! - [`ContentProvider`](content::ContentProvider) - Generative text and speech
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to the host
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map their own failures onto it, keeping the distinction between
//! "not configured" (user must act before retrying) and "call failed"
//! (the current work item may be skipped).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared through
//! `Arc` across async tasks.

pub mod content;
pub mod error;
pub mod http;
pub mod log;

pub use error::BridgeError;

// Re-export commonly used types
pub use content::{ContentProvider, SpeechRequest, TextRequest, VoiceConfig};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
