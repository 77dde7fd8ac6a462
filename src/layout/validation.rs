// SPDX-License-Identifier: GPL-3.0-only

//! Validation rules for key layout tables.
//!
//! Missing character mappings are fatal: a key the user can press must
//! produce something. Everything else is collected as a warning.

use crate::input::{KeyId, parse_key_id};
use crate::layout::types::{
    KeyLayout, LayoutSet, ParseError, ParseResult, ValidationIssue, collect_issues,
};
use std::collections::HashSet;

/// Structural keys every layout is expected to carry.
const EXPECTED_STRUCTURAL: [KeyId; 5] = [
    KeyId::Backspace,
    KeyId::Caps,
    KeyId::Language,
    KeyId::Space,
    KeyId::Submit,
];

/// Validates both layouts of a set and returns it with warnings.
pub fn validate_layouts(layouts: LayoutSet) -> Result<ParseResult<LayoutSet>, ParseError> {
    let mut issues = Vec::new();

    validate_layout(&layouts.primary, "primary", &mut issues);
    validate_layout(&layouts.secondary, "secondary", &mut issues);

    if layouts.primary.tag == layouts.secondary.tag {
        issues.push(
            ValidationIssue::warning("Both layouts use the same tag", "secondary.tag")
                .with_suggestion("Give each layout a distinct language tag"),
        );
    }

    collect_issues(layouts, issues)
}

/// Validates a single layout, appending issues under `path`.
pub fn validate_layout(layout: &KeyLayout, path: &str, issues: &mut Vec<ValidationIssue>) {
    if layout.tag.trim().is_empty() {
        issues.push(ValidationIssue::warning(
            "Layout tag is empty",
            format!("{path}.tag"),
        ));
    }

    if layout.keys.is_empty() {
        issues.push(ValidationIssue::error(
            "Layout has no keys",
            format!("{path}.keys"),
        ));
        return;
    }

    let mut seen = HashSet::new();
    let mut present = Vec::new();

    for (idx, raw) in layout.keys.iter().enumerate() {
        let key_path = format!("{path}.keys[{idx}]");

        let Some(key) = parse_key_id(raw) else {
            issues.push(ValidationIssue::error("Key identifier is empty", key_path));
            continue;
        };

        if !seen.insert(raw.as_str()) {
            issues.push(ValidationIssue::warning(
                format!("Duplicate key '{raw}'"),
                key_path.clone(),
            ));
        }

        if !key.is_structural() && layout.base_character(raw).is_none() {
            issues.push(
                ValidationIssue::error(format!("Key '{raw}' has no character mapping"), key_path)
                    .with_suggestion(format!("Add \"{raw}\" to {path}.characters")),
            );
        }

        present.push(key);
    }

    for expected in EXPECTED_STRUCTURAL.iter() {
        if !present.contains(expected) {
            issues.push(ValidationIssue::warning(
                format!("Layout has no '{}' key", expected.as_str()),
                format!("{path}.keys"),
            ));
        }
    }

    for (idx, brk) in layout.row_breaks.iter().enumerate() {
        if !layout.keys.contains(brk) {
            issues.push(ValidationIssue::warning(
                format!("Row break '{brk}' is not a key of this layout"),
                format!("{path}.row_breaks[{idx}]"),
            ));
        }
    }
}
