//! # Row Store
//!
//! In-memory model of a vocabulary sheet: a header, zero-based data rows,
//! and an index from recognised column names to positions.
//!
//! ## Overview
//!
//! - [`RowStore`] loads the 2-D values of a sheet, validates the mandatory
//!   columns and gives cell-level read/write access.
//! - [`RowFilter`] selects the rows a batch action targets.
//! - [`SoundMarker`] reads and writes the `[sound:<file>]` cell syntax.
//!
//! The store holds no filter or selection state; callers pass predicates in.

pub mod columns;
pub mod error;
pub mod filter;
pub mod marker;
pub mod store;

pub use error::{Result, TableError};
pub use filter::{
    data_index_to_sheet_row, sheet_row_to_data_index, CellCondition, RowFilter, SheetRowRange,
};
pub use marker::SoundMarker;
pub use store::{RowRef, RowStore};
