//! # Content Generation
//!
//! Regenerates the text and audio of vocabulary rows through a
//! [`ContentProvider`](bridge_traits::ContentProvider).
//!
//! ## Overview
//!
//! - [`FieldGenerator`]: prompts, provider calls and response cleanup for one
//!   generation group at a time
//! - [`BatchOrchestrator`]: sequential, failure-isolated, cancellable runs
//!   over many rows with progress reporting
//! - [`AudioAssetManager`]: in-memory mp3 assets and their zip export
//! - [`ContentJobs`]: the batch and single-row actions built from the above

pub mod audio;
pub mod batch;
pub mod error;
pub mod field_generator;
pub mod groups;
pub mod jobs;
pub mod prompts;
pub mod text;

pub use audio::{make_audio_filename, sanitize_label, AudioAsset, AudioAssetManager};
pub use batch::{
    BatchOrchestrator, BatchResult, BatchSession, BusyGuard, EventBusProgress, FailedRow, NoopProgress,
    ProgressObserver, RowOutcome, RowTask,
};
pub use error::{GenerationError, Result};
pub use field_generator::{apply_group_content, FieldGenerator, GroupContent, RowContext};
pub use groups::{ColumnRole, ExampleSlot, GroupName};
pub use jobs::{ContentJobs, PassResult, SharedAssets, SharedRowStore};
pub use prompts::{PromptBuilder, SourceKind};
pub use text::strip_outer_quotes;
