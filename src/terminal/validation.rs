// SPDX-License-Identifier: GPL-3.0-only

//! Local validation of submitted text.

use crate::config::{MessageCategory, ValidationConfig};
use std::fmt;

/// Why submitted text was rejected before reaching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing left after trimming
    Empty,
    TooShort { length: usize, min: usize },
    TooLong { length: usize, max: usize },
}

impl ValidationError {
    /// Message pool used to report this error.
    pub fn category(&self) -> MessageCategory {
        match self {
            ValidationError::Empty => MessageCategory::EmptyInput,
            ValidationError::TooShort { .. } => MessageCategory::TooShort,
            ValidationError::TooLong { .. } => MessageCategory::ValidationError,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "Input is empty"),
            ValidationError::TooShort { length, min } => {
                write!(f, "Input has {} character(s), at least {} required", length, min)
            }
            ValidationError::TooLong { length, max } => {
                write!(f, "Input has {} characters, at most {} allowed", length, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks the trimmed length of `raw` against the configured limits and
/// returns the trimmed text.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_input<'a>(
    raw: &'a str,
    limits: &ValidationConfig,
) -> Result<&'a str, ValidationError> {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        Err(ValidationError::Empty)
    } else if length < limits.min_length {
        Err(ValidationError::TooShort {
            length,
            min: limits.min_length,
        })
    } else if length > limits.max_length {
        Err(ValidationError::TooLong {
            length,
            max: limits.max_length,
        })
    } else {
        Ok(trimmed)
    }
}
