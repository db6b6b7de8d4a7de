//! In-memory vocabulary table.

use crate::columns::{EXPECTED_COLUMNS, MANDATORY_COLUMNS};
use crate::error::{Result, TableError};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Header plus data rows of one sheet.
///
/// Data rows are indexed from zero and never include the header. Every row is
/// exactly as long as the header: a cell that was missing in the source reads
/// as `""`, cells past the last header column are dropped on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStore {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    column_index: HashMap<String, usize>,
}

/// Borrowed view of one data row, handed to visibility predicates.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    pub index: usize,
    cells: &'a [String],
}

impl<'a> RowRef<'a> {
    pub fn cell(&self, column: usize) -> &'a str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &'a [String] {
        self.cells
    }
}

impl RowStore {
    /// Builds a store from a header and data rows.
    ///
    /// # Errors
    ///
    /// [`TableError::Schema`] when a mandatory column is absent. Nothing is
    /// kept from a rejected load.
    pub fn load(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let missing: Vec<String> = MANDATORY_COLUMNS
            .iter()
            .filter(|name| !header.iter().any(|h| h == *name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::Schema { missing });
        }

        let mut column_index = HashMap::new();
        for name in EXPECTED_COLUMNS {
            // First occurrence wins when a header repeats.
            if let Some(position) = header.iter().position(|h| h == name) {
                column_index.insert(name.to_string(), position);
            }
        }

        let width = header.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                if row.len() > width {
                    warn!(
                        row = index,
                        dropped = row.len() - width,
                        "Ignoring cells beyond the header"
                    );
                }
                row.resize(width, String::new());
                row
            })
            .collect::<Vec<_>>();

        debug!(
            rows = rows.len(),
            columns = width,
            recognised = column_index.len(),
            "Row store loaded"
        );

        Ok(Self {
            header,
            rows,
            column_index,
        })
    }

    /// Builds a store from the 2-D shape a spreadsheet backend returns: row 0
    /// is the header.
    pub fn from_values(values: Vec<Vec<String>>) -> Result<Self> {
        let mut values = values.into_iter();
        let header = values.next().ok_or_else(|| TableError::Schema {
            missing: MANDATORY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        })?;
        Self::load(header, values.collect())
    }

    /// The 2-D shape for a wholesale overwrite of the backend range, header
    /// first.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a recognised column. Unknown or absent names give `None`.
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    /// Like [`resolve_column`](Self::resolve_column) but absent is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.resolve_column(name)
            .ok_or_else(|| TableError::column_not_found(name))
    }

    /// Recognised column names present in this sheet, in header order.
    pub fn recognised_columns(&self) -> Vec<&str> {
        let mut found: Vec<(&str, usize)> = self
            .column_index
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
            .collect();
        found.sort_by_key(|(_, index)| *index);
        found.into_iter().map(|(name, _)| name).collect()
    }

    /// Cell text, `""` when either index is out of bounds.
    pub fn get_cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cell text by column name, `""` when the column is absent.
    pub fn cell_by_name(&self, row: usize, name: &str) -> &str {
        match self.resolve_column(name) {
            Some(column) => self.get_cell(row, column),
            None => "",
        }
    }

    /// Overwrites one cell with free text.
    ///
    /// # Errors
    ///
    /// [`TableError::NotFound`] when the row or column does not exist; the
    /// table never grows on write.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        let row_count = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or_else(|| TableError::row_not_found(row, row_count))?;
        let cell = cells
            .get_mut(column)
            .ok_or_else(|| TableError::column_not_found(column))?;
        *cell = value.into();
        Ok(())
    }

    pub fn row(&self, row: usize) -> Option<RowRef<'_>> {
        self.rows.get(row).map(|cells| RowRef { index: row, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, cells)| RowRef { index, cells })
    }

    /// Data indices of rows accepted by `predicate`, ascending.
    pub fn visible_row_indices<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&RowRef<'_>) -> bool,
    {
        self.rows()
            .filter(|row| predicate(row))
            .map(|row| row.index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> RowStore {
        RowStore::from_values(vec![
            strings(&["Word", "Pronunciation", "Translation", "Notes"]),
            strings(&["苹果", "píngguǒ", "apple"]),
            strings(&["学习", "", "to study", "verb", "extra"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_minimal_header_loads() {
        let store = RowStore::load(strings(&["Word", "Translation"]), vec![]).unwrap();
        assert_eq!(store.resolve_column("Word"), Some(0));
        assert_eq!(store.resolve_column("Translation"), Some(1));
        assert_eq!(store.resolve_column("Pronunciation"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_mandatory_column() {
        let error = RowStore::load(strings(&["Word", "Pronunciation"]), vec![]).unwrap_err();
        assert_eq!(
            error,
            TableError::Schema {
                missing: vec!["Translation".to_string()]
            }
        );
    }

    #[test]
    fn test_empty_values_is_schema_error() {
        assert!(matches!(
            RowStore::from_values(vec![]),
            Err(TableError::Schema { .. })
        ));
    }

    #[test]
    fn test_rows_are_normalized_to_header_width() {
        let store = sample();
        assert_eq!(store.get_cell(0, 3), "");
        assert_eq!(store.get_cell(1, 3), "verb");
        assert_eq!(store.get_cell(1, 4), "");
        assert!(store.to_values().iter().all(|row| row.len() == 4));
    }

    #[test]
    fn test_set_cell_past_header_width_is_not_found() {
        let mut store = sample();
        assert!(matches!(
            store.set_cell(1, 4, "extra"),
            Err(TableError::NotFound(_))
        ));
        assert!(store.to_values().iter().all(|row| row.len() == 4));
    }

    #[test]
    fn test_unknown_headers_are_plain_columns() {
        let store = sample();
        assert_eq!(store.resolve_column("Notes"), None);
        assert_eq!(store.get_cell(1, 3), "verb");
        assert_eq!(store.recognised_columns(), vec!["Word", "Pronunciation", "Translation"]);
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let store = RowStore::load(strings(&["Word", "Translation", "Word"]), vec![]).unwrap();
        assert_eq!(store.resolve_column("Word"), Some(0));
    }

    #[test]
    fn test_get_cell_out_of_bounds() {
        let store = sample();
        assert_eq!(store.get_cell(99, 0), "");
        assert_eq!(store.get_cell(0, 99), "");
        assert_eq!(store.cell_by_name(0, "Hanzis"), "");
    }

    #[test]
    fn test_set_cell() {
        let mut store = sample();
        store.set_cell(1, 1, "xuéxí").unwrap();
        assert_eq!(store.cell_by_name(1, "Pronunciation"), "xuéxí");

        assert!(matches!(
            store.set_cell(2, 0, "x"),
            Err(TableError::NotFound(_))
        ));
        assert!(matches!(
            store.set_cell(0, 10, "x"),
            Err(TableError::NotFound(_))
        ));
        assert_eq!(store.row_count(), 2);
    }

    #[test]
    fn test_values_round_trip() {
        let values = vec![
            strings(&["Word", "Translation", "Sentence_01_audio"]),
            strings(&["猫", "cat", "[sound:cat_s1_12345.mp3]"]),
        ];
        let store = RowStore::from_values(values.clone()).unwrap();
        assert_eq!(store.to_values(), values);
    }

    #[test]
    fn test_visible_row_indices() {
        let store = sample();
        let pronunciation = store.resolve_column("Pronunciation").unwrap();
        let missing = store.visible_row_indices(|row| row.cell(pronunciation).trim().is_empty());
        assert_eq!(missing, vec![1]);
        assert_eq!(store.visible_row_indices(|_| true), vec![0, 1]);
    }
}
