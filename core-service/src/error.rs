use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No sheet loaded")]
    NotLoaded,

    #[error("No audio files to export")]
    NothingToExport,

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Table error: {0}")]
    Table(#[from] core_table::TableError),

    #[error("Generation error: {0}")]
    Generation(#[from] core_generation::GenerationError),
}

impl CoreError {
    /// Whether the error came from a missing credential or capability.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::Runtime(_)
                | CoreError::Generation(core_generation::GenerationError::Configuration(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
