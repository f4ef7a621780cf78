//! Error types for the validation service

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown validation event type '{0}'")]
    UnknownEvent(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
