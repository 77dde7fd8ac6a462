// SPDX-License-Identifier: GPL-3.0-only

//! Layout table loading.
//!
//! Layout sets are JSON documents with a `primary` and a `secondary` layout.
//! The bundled set is embedded in the binary; a replacement can be loaded
//! from disk.

use crate::app_settings;
use crate::layout::types::{LayoutSet, ParseError, ParseResult};
use crate::layout::validation::validate_layouts;
use crate::resources;
use std::fs;
use std::path::Path;

/// Parses a layout set from a JSON file.
///
/// I/O errors (file not found, permission denied, ...) and JSON errors are
/// reported separately, both carrying the file path.
///
/// # Example
///
/// ```rust,ignore
/// use wordkiosk::layout::parse_layouts_file;
///
/// match parse_layouts_file("layouts.json") {
///     Ok(result) => println!("Primary layout: {}", result.value.primary.tag),
///     Err(e) => eprintln!("Failed to load layouts: {}", e),
/// }
/// ```
pub fn parse_layouts_file(path: impl AsRef<Path>) -> Result<ParseResult<LayoutSet>, ParseError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let json_str =
        fs::read_to_string(path).map_err(|e| ParseError::io_error_with_path(e, &display))?;

    let layouts: LayoutSet = serde_json::from_str(&json_str)
        .map_err(|e| ParseError::json_error_with_path(e, &display))?;

    validate_layouts(layouts).map_err(|e| e.with_path(display))
}

/// Parses a layout set from a JSON string.
pub fn parse_layouts_from_string(json: &str) -> Result<ParseResult<LayoutSet>, ParseError> {
    let layouts: LayoutSet = serde_json::from_str(json).map_err(ParseError::json_error)?;
    validate_layouts(layouts)
}

/// Loads the layout set bundled with the binary.
pub fn default_layouts() -> Result<ParseResult<LayoutSet>, ParseError> {
    let json = resources::load_text(app_settings::DEFAULT_LAYOUTS_RESOURCE)?;
    parse_layouts_from_string(&json)
}

/// Loads layouts from `path` when given, otherwise the bundled set.
pub fn load_layouts(path: Option<&Path>) -> Result<ParseResult<LayoutSet>, ParseError> {
    match path {
        Some(path) => parse_layouts_file(path),
        None => default_layouts(),
    }
}

// ============================================================================
// Tests
// ============================================================================
