//! Error types for the reminder engine.

use std::fmt;

use thiserror::Error;

/// Which end of a time range failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    From,
    To,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bound::From => write!(f, "from"),
            Bound::To => write!(f, "to"),
        }
    }
}

/// Errors that can occur in reminder operations.
#[derive(Error, Debug)]
pub enum RemindError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Reminder not found: {0}")]
    NotFound(String),

    #[error("A repeat rule cannot have both a count and an end date")]
    TerminationConflict,

    #[error("Invalid '{bound}' time: {message}")]
    Range { bound: Bound, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RemindError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        RemindError::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn range(bound: Bound, message: impl Into<String>) -> Self {
        RemindError::Range {
            bound,
            message: message.into(),
        }
    }
}

/// Result type alias for reminder operations.
pub type RemindResult<T> = Result<T, RemindError>;
