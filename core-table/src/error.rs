use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Missing essential columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl TableError {
    pub fn row_not_found(row: usize, row_count: usize) -> Self {
        Self::NotFound(format!("row {} (table has {} rows)", row, row_count))
    }

    pub fn column_not_found(column: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("column {}", column))
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let error = TableError::Schema {
            missing: vec!["Word".to_string(), "Translation".to_string()],
        };
        assert_eq!(error.to_string(), "Missing essential columns: Word, Translation");
    }

    #[test]
    fn test_not_found_messages() {
        assert_eq!(
            TableError::row_not_found(7, 3).to_string(),
            "Not found: row 7 (table has 3 rows)"
        );
        assert_eq!(
            TableError::column_not_found("Sentence_01_audio").to_string(),
            "Not found: column Sentence_01_audio"
        );
    }
}
