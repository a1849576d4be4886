use thiserror::Error;

/// Errors raised by the prediction engine.
///
/// Only `InvalidInput` ever reaches a caller of the orchestrator; the model
/// variants trigger the rule-based fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("invalid input for {field}: {value}")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("no trained model loaded")]
    ModelUnavailable,

    #[error("model incompatible with feature contract: {0}")]
    ModelIncompatible(String),

    #[error("model prediction failed: {0}")]
    ModelFailed(String),
}
