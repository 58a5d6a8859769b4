//! Validation error types.
//!
//! These errors are raised when a value object or the result aggregate is
//! constructed from invalid input. The ranking and analytics engines never
//! return them: once a `ClassResult` exists, every operation over it is total.

use thiserror::Error;

/// Errors that can occur while building marks, percentages, or a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A mark below zero.
    #[error("marks cannot be negative: {0}")]
    NegativeMarks(f64),

    /// A mark that is NaN or infinite.
    #[error("marks must be a finite number")]
    NonFiniteMarks,

    /// A raw mark that does not parse as a number.
    #[error("marks must be numeric, got '{0}'")]
    NonNumericMarks(String),

    /// A mark above the configured maximum for the sheet.
    #[error("marks {value} exceed the maximum of {maximum}")]
    MarksAboveMaximum { value: f64, maximum: f64 },

    /// A percentage outside [0, 100].
    #[error("percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(f64),

    /// A maximum-marks value that is zero, negative, or not finite.
    #[error("maximum marks must be a positive number, got {0}")]
    InvalidMaximum(f64),

    /// A subject with a blank name.
    #[error("subject name cannot be empty")]
    EmptySubjectName,

    /// A student with a blank roll number.
    #[error("roll number cannot be empty")]
    EmptyRollNumber,

    /// The same subject declared twice on one result.
    #[error("duplicate subject: {0}")]
    DuplicateSubject(String),

    /// Two students sharing a roll number on one result.
    #[error("duplicate roll number: {0}")]
    DuplicateRollNumber(String),
}
