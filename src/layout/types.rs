// SPDX-License-Identifier: GPL-3.0-only

//! Core data types for key layouts and for loading JSON documents.
//!
//! This module defines the error and warning types shared by every JSON
//! loader in the crate (layouts and the kiosk configuration), plus the
//! layout tables themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Error Handling Types
// ============================================================================

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal error that prevents the document from being used
    Error,
    /// Non-fatal issue that should be addressed
    Warning,
}

/// A validation issue discovered while loading a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Severity level (Error or Warning)
    pub severity: Severity,
    /// Human-readable description of the issue
    pub message: String,
    /// Path to the field that caused the issue (e.g., "secondary.keys[21]")
    pub field_path: String,
    /// Optional suggestion for how to fix the issue
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates a new validation issue.
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        field_path: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            field_path: field_path.into(),
            suggestion: None,
        }
    }

    /// Creates an error-level issue.
    pub fn error(message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, field_path)
    }

    /// Creates a warning-level issue.
    pub fn warning(message: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message, field_path)
    }

    /// Adds a suggestion to the validation issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Returns `true` if this issue is fatal.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity_str = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };

        write!(f, "[{}] {}: {}", severity_str, self.field_path, self.message)?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

/// Error type for loading JSON documents (layouts and configuration).
#[derive(Debug)]
pub enum ParseError {
    /// I/O error occurred while reading a file
    IoError {
        /// The underlying I/O error
        source: std::io::Error,
        /// Optional file path that caused the error
        file_path: Option<String>,
        /// Optional suggestion for fixing the error
        suggestion: Option<String>,
    },

    /// JSON parsing error
    JsonError {
        /// The underlying JSON parsing error
        source: serde_json::Error,
        /// Optional file path being parsed
        file_path: Option<String>,
        /// Line number where the error occurred (from serde_json)
        line_number: Option<usize>,
    },

    /// Validation errors found after parsing
    ValidationError {
        /// List of validation issues found
        issues: Vec<ValidationIssue>,
        /// Optional file path being validated
        file_path: Option<String>,
    },

    /// An embedded resource is missing from the binary
    MissingResource {
        /// Name of the resource
        name: String,
    },
}

impl ParseError {
    /// Creates an I/O error with file path.
    pub fn io_error_with_path(source: std::io::Error, file_path: impl Into<String>) -> Self {
        Self::IoError {
            source,
            file_path: Some(file_path.into()),
            suggestion: Some("Check that the file exists and you have read permissions".into()),
        }
    }

    /// Creates a JSON parsing error with context.
    pub fn json_error(source: serde_json::Error) -> Self {
        let line_number = Some(source.line()).filter(|line| *line > 0);
        Self::JsonError {
            source,
            file_path: None,
            line_number,
        }
    }

    /// Creates a JSON parsing error with file path.
    pub fn json_error_with_path(source: serde_json::Error, file_path: impl Into<String>) -> Self {
        let line_number = Some(source.line()).filter(|line| *line > 0);
        Self::JsonError {
            source,
            file_path: Some(file_path.into()),
            line_number,
        }
    }

    /// Creates a validation error from a list of issues.
    pub fn validation_error(issues: Vec<ValidationIssue>) -> Self {
        Self::ValidationError {
            issues,
            file_path: None,
        }
    }

    /// Attaches a file path to errors that were raised without one.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        match self {
            ParseError::ValidationError {
                issues,
                file_path: None,
            } => ParseError::ValidationError {
                issues,
                file_path: Some(path.into()),
            },
            ParseError::JsonError {
                source,
                file_path: None,
                line_number,
            } => ParseError::JsonError {
                source,
                file_path: Some(path.into()),
                line_number,
            },
            other => other,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::IoError {
                source,
                file_path,
                suggestion,
            } => {
                write!(f, "I/O error")?;
                if let Some(path) = file_path {
                    write!(f, " reading file '{}'", path)?;
                }
                write!(f, ": {}", source)?;
                if let Some(hint) = suggestion {
                    write!(f, "\n  Suggestion: {}", hint)?;
                }
            }
            ParseError::JsonError {
                source,
                file_path,
                line_number,
            } => {
                write!(f, "JSON parsing error")?;
                if let Some(path) = file_path {
                    write!(f, " in file '{}'", path)?;
                }
                if let Some(line) = line_number {
                    write!(f, " at line {}", line)?;
                }
                write!(f, ": {}", source)?;
            }
            ParseError::ValidationError { issues, file_path } => {
                write!(f, "Validation failed")?;
                if let Some(path) = file_path {
                    write!(f, " for file '{}'", path)?;
                }
                writeln!(f, " with {} issue(s):", issues.len())?;
                for (i, issue) in issues.iter().enumerate() {
                    write!(f, "  {}. {}", i + 1, issue)?;
                    if i + 1 < issues.len() {
                        writeln!(f)?;
                    }
                }
            }
            ParseError::MissingResource { name } => {
                write!(f, "Embedded resource '{}' is missing", name)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::IoError { source, .. } => Some(source),
            ParseError::JsonError { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// ParseResult Type
// ============================================================================

/// Result of successfully loading a document, with optional warnings.
///
/// Loading is permissive: a usable value is returned even when non-fatal
/// validation issues were found.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult<T> {
    /// The successfully loaded value
    pub value: T,
    /// Non-fatal validation warnings
    pub warnings: Vec<ValidationIssue>,
}

impl<T> ParseResult<T> {
    /// Creates a new parse result with no warnings.
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Creates a new parse result with warnings.
    pub fn with_warnings(value: T, warnings: Vec<ValidationIssue>) -> Self {
        Self { value, warnings }
    }

    /// Returns true if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Logs every warning through `tracing`.
    pub fn log_warnings(&self, what: &str) {
        for warning in &self.warnings {
            tracing::warn!("{}: {}", what, warning);
        }
    }

    /// Consumes the result and returns the value, discarding warnings.
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Splits collected issues into a fatal error or a permissive result.
pub(crate) fn collect_issues<T>(
    value: T,
    issues: Vec<ValidationIssue>,
) -> Result<ParseResult<T>, ParseError> {
    if issues.iter().any(ValidationIssue::is_error) {
        let errors = issues.into_iter().filter(ValidationIssue::is_error).collect();
        return Err(ParseError::validation_error(errors));
    }
    Ok(ParseResult::with_warnings(value, issues))
}

// ============================================================================
// Layout Data Structures
// ============================================================================

/// Which of the two layouts is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// The first layout (English in the bundled table)
    #[default]
    Primary,
    /// The second layout (Russian in the bundled table)
    Secondary,
}

impl Language {
    /// Returns the other language.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Language::Primary => Language::Secondary,
            Language::Secondary => Language::Primary,
        }
    }
}

/// One key layout: the ordered key sequence and its character table.
///
/// Key identifiers are strings. Structural identifiers (`backspace`, `caps`,
/// `lang`, `space`, `done`/`enter`) never need a character entry; every other
/// identifier in `keys` must have one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    /// Language tag shown on the language key (e.g., "en")
    pub tag: String,
    /// Human readable layout name
    #[serde(default)]
    pub name: String,
    /// Keys in display order
    pub keys: Vec<String>,
    /// Keys after which the surface starts a new row
    #[serde(default)]
    pub row_breaks: Vec<String>,
    /// Key identifier to base character
    pub characters: HashMap<String, String>,
}

impl KeyLayout {
    /// Returns the base character for a key, if mapped.
    pub fn base_character(&self, key_id: &str) -> Option<&str> {
        self.characters.get(key_id).map(String::as_str)
    }

    /// Returns `true` if a new row starts after this key.
    pub fn breaks_after(&self, key_id: &str) -> bool {
        self.row_breaks.iter().any(|k| k == key_id)
    }
}

/// The pair of layouts the keyboard switches between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSet {
    /// Layout used for [`Language::Primary`]
    pub primary: KeyLayout,
    /// Layout used for [`Language::Secondary`]
    pub secondary: KeyLayout,
}

impl LayoutSet {
    /// Returns the layout for a language.
    pub fn get(&self, language: Language) -> &KeyLayout {
        match language {
            Language::Primary => &self.primary,
            Language::Secondary => &self.secondary,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
