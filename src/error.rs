//! Error Types
//!
//! Validation failures are values, not errors. `ConfigError` is a setup
//! diagnostic that never aborts assembly; `FormError` is fatal.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Input group {0} initialized without a validation type")]
    MissingValidationType(String),

    #[error("Input {1} in group {0} needs both an input id and an input type")]
    IncompleteInput(String, String),

    #[error("Conditional input group {0} initialized without a requirement condition")]
    MissingGroupCondition(String),

    #[error("Conditional input {0} initialized without a requirement condition")]
    MissingInputCondition(String),

    #[error("Input {0} is not present on the page")]
    UnknownInput(String),

    #[error("Input {0} has event handlers but no bound surface")]
    MissingEventSurface(String),

    #[error("Payment {0} input needs to be configured for digital disbursements")]
    MissingPaymentSlot(String),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Form configuration requires engine >= {0}, current is {1}")]
    EngineVersionMismatch(String, String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Signature error: {0}")]
    Signature(String),
}
