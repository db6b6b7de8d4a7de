//! Row visibility filters and sheet row numbering.
//!
//! Spreadsheet row numbers are 1-based with the header on row 1, so the first
//! data row is sheet row 2. These helpers are the only place that offset is
//! applied.

use crate::store::RowRef;
use serde::{Deserialize, Serialize};

/// Sheet row number of the first data row.
pub const FIRST_DATA_SHEET_ROW: usize = 2;

/// Zero-based data index for a sheet row number. The header row and row 0
/// have no data index.
pub fn sheet_row_to_data_index(sheet_row: usize) -> Option<usize> {
    sheet_row.checked_sub(FIRST_DATA_SHEET_ROW)
}

pub fn data_index_to_sheet_row(index: usize) -> usize {
    index + FIRST_DATA_SHEET_ROW
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellCondition {
    /// Cell is blank after trimming whitespace
    IsEmpty,
    IsNotEmpty,
}

impl CellCondition {
    pub fn matches(&self, cell: &str) -> bool {
        let empty = cell.trim().is_empty();
        match self {
            CellCondition::IsEmpty => empty,
            CellCondition::IsNotEmpty => !empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCondition {
    pub column: usize,
    pub condition: CellCondition,
}

/// Inclusive range of sheet row numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRowRange {
    pub first: usize,
    pub last: usize,
}

impl SheetRowRange {
    pub fn contains_data_index(&self, index: usize) -> bool {
        let sheet_row = data_index_to_sheet_row(index);
        self.first <= sheet_row && sheet_row <= self.last
    }
}

/// Which rows a batch action targets. All set conditions must hold; an
/// empty filter shows every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: Option<ColumnCondition>,
    pub sheet_rows: Option<SheetRowRange>,
}

impl RowFilter {
    /// Accepts every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_empty(mut self, column: usize) -> Self {
        self.column = Some(ColumnCondition {
            column,
            condition: CellCondition::IsEmpty,
        });
        self
    }

    pub fn where_not_empty(mut self, column: usize) -> Self {
        self.column = Some(ColumnCondition {
            column,
            condition: CellCondition::IsNotEmpty,
        });
        self
    }

    /// Restricts to sheet rows `first..=last`. Bounds given in reverse are
    /// swapped.
    pub fn sheet_rows(mut self, first: usize, last: usize) -> Self {
        self.sheet_rows = Some(SheetRowRange {
            first: first.min(last),
            last: first.max(last),
        });
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.column.is_none() && self.sheet_rows.is_none()
    }

    pub fn matches(&self, row: &RowRef<'_>) -> bool {
        if let Some(range) = &self.sheet_rows {
            if !range.contains_data_index(row.index) {
                return false;
            }
        }
        match &self.column {
            Some(condition) => condition.condition.matches(row.cell(condition.column)),
            None => true,
        }
    }
}
