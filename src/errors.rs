use crate::execution::ExecutionError;
use crate::utils::config_loader::LoadConfigError;
use alloy_primitives::Address;
use eyre::Report;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    // Input validation, the offending record is rejected and processing continues
    #[error("non-monotonic sequence: {previous} followed by {next}")]
    NonMonotonicSequence { previous: u64, next: u64 },
    #[error("trade for pool {found} routed to engine of pool {expected}")]
    PoolMismatch { expected: Address, found: Address },
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration
    #[error(transparent)]
    Config(#[from] LoadConfigError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Collaborators
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    InternalEyre(Report),
}

impl GuardError {
    /// Whether the error only rejects one record rather than signalling a fault
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::NonMonotonicSequence { .. } | Self::PoolMismatch { .. } | Self::InvalidInput(_))
    }
}

impl From<Report> for GuardError {
    fn from(error: Report) -> Self {
        Self::InternalEyre(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        assert!(GuardError::NonMonotonicSequence { previous: 5, next: 5 }.is_invalid_input());
        assert!(GuardError::InvalidInput("x".to_string()).is_invalid_input());
        assert!(!GuardError::InvalidConfig("x".to_string()).is_invalid_input());
    }

    #[test]
    fn test_display() {
        let err = GuardError::NonMonotonicSequence { previous: 7, next: 3 };
        assert_eq!(err.to_string(), "non-monotonic sequence: 7 followed by 3");
    }
}
