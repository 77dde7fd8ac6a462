// SPDX-License-Identifier: GPL-3.0-only

//! Key layouts for the virtual keyboard.
//!
//! Exactly two layouts are supported, a primary and a secondary one, which the
//! keyboard switches between with its language key. Each layout is an ordered
//! key sequence plus a table mapping key identifiers to base characters.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use wordkiosk::layout::{default_layouts, KeyLayoutProvider, Language};
//!
//! let result = default_layouts()?;
//! result.log_warnings("layouts");
//!
//! let provider = KeyLayoutProvider::new(result.into_inner());
//! assert_eq!(provider.character_for(Language::Secondary, "q", true), "Й");
//! ```
//!
//! # Error Handling
//!
//! Loading is permissive: non-fatal issues (a missing structural key, a stray
//! row break) are returned as warnings in the `ParseResult`, while a character
//! key without a mapping is a fatal `ParseError::ValidationError`.
//!
//! The same error types are used by the configuration loader.

// Sub-modules
pub mod parser;
pub mod provider;
pub mod types;
pub mod validation;

// Re-export public API - Error handling types
pub use types::{ParseError, ParseResult, Severity, ValidationIssue};

// Re-export public API - Loading
pub use parser::{default_layouts, load_layouts, parse_layouts_file, parse_layouts_from_string};

// Re-export public API - Data structures
pub use provider::KeyLayoutProvider;
pub use types::{KeyLayout, Language, LayoutSet};
