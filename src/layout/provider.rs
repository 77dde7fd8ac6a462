// SPDX-License-Identifier: GPL-3.0-only

//! Character lookup for the active layout.

use crate::layout::types::{Language, LayoutSet};

/// Maps `(language, key, shift)` to the text a key produces.
///
/// The provider holds no state beyond the layout tables. The active language
/// is owned by the keyboard and passed in on every call.
#[derive(Debug, Clone)]
pub struct KeyLayoutProvider {
    layouts: LayoutSet,
}

impl KeyLayoutProvider {
    /// Creates a provider over a validated layout set.
    pub fn new(layouts: LayoutSet) -> Self {
        Self { layouts }
    }

    /// Returns the layout tables.
    pub fn layouts(&self) -> &LayoutSet {
        &self.layouts
    }

    /// Returns the text a key produces.
    ///
    /// Falls back to the key identifier itself when the layout has no mapping.
    /// The result is upper-cased when `shift_active` is set and lower-cased
    /// otherwise, for every script.
    pub fn character_for(&self, language: Language, key_id: &str, shift_active: bool) -> String {
        let base = self
            .layouts
            .get(language)
            .base_character(key_id)
            .unwrap_or(key_id);

        if shift_active {
            base.to_uppercase()
        } else {
            base.to_lowercase()
        }
    }
}
