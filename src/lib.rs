//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-generation`, `core-table`).
//! Host applications can depend on `anki-deck-workspace` and enable the
//! documented features without needing to wire each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "generation")]
pub use core_generation as generation;

#[cfg(any(feature = "table-only", feature = "generation"))]
pub use core_table as table;
