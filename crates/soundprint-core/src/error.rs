use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// The record already carries a reference and cannot be inserted again.
    #[error("{entity} is already persisted with reference {id}")]
    AlreadyPersisted { entity: &'static str, id: String },

    /// A hash-bin vector did not have one value per hash table.
    #[error("expected {expected} hash bins, got {actual}")]
    BucketCount { expected: usize, actual: usize },

    #[error("threshold {threshold} is outside of 1..={max}")]
    ThresholdOutOfRange { threshold: u32, max: u32 },

    #[error("sub-fingerprint signature is empty")]
    EmptySignature,

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns `true` for errors caused by the caller breaking an operation's
    /// preconditions, as opposed to failures of the storage substrate.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPersisted { .. }
                | Self::BucketCount { .. }
                | Self::ThresholdOutOfRange { .. }
                | Self::EmptySignature
                | Self::InvalidReference(_)
        )
    }

    /// Returns `true` when the error indicates a referenced entity is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_classification() {
        assert!(Error::EmptySignature.is_contract_violation());
        assert!(Error::BucketCount {
            expected: 25,
            actual: 3
        }
        .is_contract_violation());
        assert!(!Error::InvalidData("bad".to_string()).is_contract_violation());
        assert!(!Error::NotFound {
            entity: "track",
            id: "x".to_string()
        }
        .is_contract_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ThresholdOutOfRange {
            threshold: 26,
            max: 25,
        };
        assert_eq!(err.to_string(), "threshold 26 is outside of 1..=25");
    }
}
