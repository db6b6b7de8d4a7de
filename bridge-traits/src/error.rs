use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge capability not configured: {0}")]
    NotConfigured(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error means the capability was never usable (as opposed to
    /// a call that was attempted and failed).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotAvailable(_) | Self::NotConfigured(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(BridgeError::NotConfigured("api key".into()).is_configuration());
        assert!(BridgeError::NotAvailable("http".into()).is_configuration());
        assert!(!BridgeError::OperationFailed("boom".into()).is_configuration());
        assert!(!BridgeError::Http {
            status: 500,
            message: "down".into()
        }
        .is_configuration());
    }

    #[test]
    fn test_http_error_display() {
        let error = BridgeError::Http {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 401: Incorrect API key provided");
    }
}
