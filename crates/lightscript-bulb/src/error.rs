//! Error types for bulb operations

use thiserror::Error;

/// Result type for bulb operations
pub type BulbResult<T> = Result<T, BulbError>;

/// Errors raised by bulb drivers
#[derive(Debug, Error)]
pub enum BulbError {
    /// The bulb or its bridge could not be reached; worth retrying
    #[error("cannot reach bulb: {0}")]
    Connectivity(String),

    /// The bridge answered with an error for the request
    #[error("bridge rejected {address}: {description}")]
    Rejected {
        address: String,
        description: String,
    },

    /// The bridge answered with something we do not understand
    #[error("unexpected bridge response: {0}")]
    Protocol(String),
}

impl BulbError {
    /// Whether this error is a transient connectivity failure
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

impl From<reqwest::Error> for BulbError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() || e.is_decode() {
            Self::Protocol(e.to_string())
        } else {
            Self::Connectivity(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_classification() {
        assert!(BulbError::Connectivity("refused".into()).is_connectivity());
        assert!(!BulbError::Protocol("garbage".into()).is_connectivity());
        assert!(!BulbError::Rejected {
            address: "/lights/1/state/bri".into(),
            description: "invalid value".into(),
        }
        .is_connectivity());
    }
}
