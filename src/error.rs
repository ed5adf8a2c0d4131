//! Error kinds raised by the quality metrics and correction routines.
//!
//! Hard failures ([`AuditError::SchemaMismatch`],
//! [`AuditError::InsufficientKeyCoverage`], [`AuditError::EmptyInput`]) abort
//! the operation and propagate to the caller. [`AuditError::InvalidColumn`] and
//! [`AuditError::InputContractViolation`] are soft failures: the operations that
//! raise them log the error and return an undefined result or do nothing.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuditError {
    #[error("Column '{column}' not found in table '{table}'")]
    SchemaMismatch { table: String, column: String },

    #[error(
        "Key columns too sparse to join: '{left_column}' is {left_null_percent:.2}% null in '{left_table}', \
         '{right_column}' is {right_null_percent:.2}% null in '{right_table}' (threshold {threshold_percent:.2}%)"
    )]
    InsufficientKeyCoverage {
        left_table: String,
        left_column: String,
        left_null_percent: f64,
        right_table: String,
        right_column: String,
        right_null_percent: f64,
        threshold_percent: f64,
    },

    #[error("Column '{column}' is not a valid column of table '{table}'")]
    InvalidColumn { table: String, column: String },

    #[error("Invalid arguments for {operation}: {reason}")]
    InputContractViolation {
        operation: &'static str,
        reason: String,
    },

    #[error("Table '{table}' has no rows to measure")]
    EmptyInput { table: String },
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;
