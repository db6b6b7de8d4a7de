use bridge_traits::error::BridgeError;
use core_table::TableError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A credential or capability is missing; nothing was attempted
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote text or speech call failed
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Schema error: missing columns {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("A batch is already running")]
    BatchInProgress,

    #[error("Audio archive error: {0}")]
    Archive(String),
}

impl GenerationError {
    /// Errors that abort a whole action rather than one row.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Schema { .. } | Self::BatchInProgress
        )
    }
}

impl From<BridgeError> for GenerationError {
    fn from(error: BridgeError) -> Self {
        if error.is_configuration() {
            Self::Configuration(error.to_string())
        } else {
            Self::Provider(error.to_string())
        }
    }
}

impl From<TableError> for GenerationError {
    fn from(error: TableError) -> Self {
        match error {
            TableError::Schema { missing } => Self::Schema { missing },
            TableError::NotFound(what) => Self::NotFound(what),
        }
    }
}

impl From<zip::result::ZipError> for GenerationError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive(error.to_string())
    }
}

impl From<std::io::Error> for GenerationError {
    fn from(error: std::io::Error) -> Self {
        Self::Archive(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
