//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the deck content engine:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its configuration types,
//! logging conventions and the broadcast channel that keeps a host view in
//! sync with batch progress and cell edits.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{AudioConfig, CoreConfig, CoreConfigBuilder, LanguageProfile, ProviderConfig};
pub use error::{Error, Result};
pub use events::{BatchEvent, CoreEvent, EventBus, EventStream, TableEvent};
