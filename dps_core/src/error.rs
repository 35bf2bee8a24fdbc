//! Error types for the DPS model

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised while resolving a build
///
/// None of these are retried: every variant is a precondition that was
/// checked once and failed.
#[derive(Error, Debug)]
pub enum CalcError {
    /// Malformed descriptor or probability table
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The requested combination has no modeled formula
    #[error("Input not modeled: {0}")]
    UnmodeledInput(String),
    /// A proc formula produced a value outside its natural bound
    #[error("Proc '{proc_name}' resolved to uptime {uptime}, outside [0, {bound}]")]
    UptimeOutOfRange {
        proc_name: String,
        uptime: f64,
        bound: f64,
    },
    /// Domain error raised by a rotation model; passed through untouched
    #[error("Rotation error: {0}")]
    Rotation(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CalcError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CalcError::Configuration(message.into())
    }

    pub fn unmodeled(message: impl Into<String>) -> Self {
        CalcError::UnmodeledInput(message.into())
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
