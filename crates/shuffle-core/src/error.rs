//! Error taxonomy for matrix selection and configuration building.
//!
//! Rejected combinations are not errors; they are reported as a
//! [`Verdict`](crate::validator::Verdict). Everything here is a malformed
//! input that should stop the run.

/// Shuffle matrix errors.
#[derive(Debug, thiserror::Error)]
pub enum ShuffleError {
    #[error("required axis missing: {0}")]
    MissingAxis(String),

    #[error("axis {0} has no candidate values")]
    EmptyAxis(String),

    #[error("axis {axis} has invalid value {value}: expected {expected}")]
    InvalidAxisValue {
        axis: String,
        value: String,
        expected: &'static str,
    },

    #[error("no interpreter version known for base image: {0}")]
    UnknownBaseImage(String),

    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),

    #[error("no valid combination found within {rounds} rounds")]
    Exhausted { rounds: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for shuffle matrix operations.
pub type Result<T> = std::result::Result<T, ShuffleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_axis_value_display() {
        let err = ShuffleError::InvalidAxisValue {
            axis: "cuda_cudnn_nccl".to_string(),
            value: "cuda80".to_string(),
            expected: "a 3-part tuple",
        };
        let msg = err.to_string();
        assert!(msg.contains("cuda_cudnn_nccl"));
        assert!(msg.contains("3-part tuple"));
    }

    #[test]
    fn test_exhausted_display() {
        let err = ShuffleError::Exhausted { rounds: 50 };
        assert_eq!(err.to_string(), "no valid combination found within 50 rounds");
    }
}
