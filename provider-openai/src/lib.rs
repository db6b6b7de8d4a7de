//! # OpenAI Provider
//!
//! Text generation and speech synthesis against an OpenAI-compatible HTTP
//! API, exposed through the [`ContentProvider`](bridge_traits::ContentProvider)
//! bridge trait.
//!
//! ## Overview
//!
//! - [`OpenAiClient`]: chat-completions and audio-speech calls over an
//!   injected [`HttpClient`](bridge_traits::HttpClient)
//! - [`OpenAiError`]: provider failures, convertible into `BridgeError`

pub mod client;
pub mod error;
mod types;

pub use client::OpenAiClient;
pub use error::{OpenAiError, Result};
