use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Errors raised by the consensus and scoring pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsensusError {
    #[error("invalid configuration for `{parameter}`: {reason}")]
    InvalidConfiguration {
        parameter: &'static str,
        reason: String,
    },

    #[error("consensus model is empty, no reference point to score against")]
    EmptyConsensusModel,

    #[error("malformed point at index {index}: {reason}")]
    MalformedPoint { index: usize, reason: String },

    #[error("scoring worker failed: {0}")]
    WorkerFailed(String),
}

impl ConsensusError {
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }

    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPoint {
            index,
            reason: reason.into(),
        }
    }
}

/// Fails unless `value` is a finite, strictly positive number.
pub fn require_positive(parameter: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ConsensusError::invalid(
            parameter,
            format!("must be finite, got {}", value),
        ));
    }
    if value <= 0.0 {
        return Err(ConsensusError::invalid(
            parameter,
            format!("must be greater than zero, got {}", value),
        ));
    }
    Ok(())
}
