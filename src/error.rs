//! Crate-wide error type.
//!
//! All fallible operations in this crate — schema encoding, dataset
//! construction, rule parsing, cross-validation parameter checks — surface
//! through [`RuleInductionError`]. Nothing is swallowed internally; divide-
//! by-zero cases inside quality measures are not errors, they yield `NaN`
//! (see the `measures` module).

use thiserror::Error;

/// The single error type returned by fallible operations in this crate.
#[derive(Debug, Error)]
pub enum RuleInductionError {
    /// A nominal string value has no matching level, or a numerical string
    /// could not be parsed as a float, or a rule referenced an attribute
    /// name that does not exist in the dataset's schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A column, weight vector, or prediction vector disagreed in length
    /// with the row count already established for the dataset.
    #[error("shape mismatch: expected {expected} rows, got {actual}")]
    ShapeMismatch {
        /// Row count established by the first column added to the dataset.
        expected: usize,
        /// Row count of the column/vector that disagreed.
        actual: usize,
    },

    /// A rule-text or ARFF-text token stream did not match the expected
    /// grammar.
    #[error("parse error: {0}")]
    ParseError(String),

    /// A caller-supplied argument (fold count, class index, operator
    /// symbol, …) was out of the accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying I/O failure while reading or writing an ARFF file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type RuleInductionResult<T> = Result<T, RuleInductionError>;
