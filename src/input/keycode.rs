// SPDX-License-Identifier: GPL-3.0-only

//! Key identifier parsing for the virtual keyboard.
//!
//! Layout tables and input sources name keys with plain strings. This module
//! resolves those strings into a [`KeyId`], separating the structural keys
//! (which change keyboard state) from character keys (which append text).
//!
//! # Recognised identifiers
//!
//! | String              | Key                     |
//! |---------------------|-------------------------|
//! | `backspace`         | [`KeyId::Backspace`]    |
//! | `caps`              | [`KeyId::Caps`]         |
//! | `lang`              | [`KeyId::Language`]     |
//! | `space`             | [`KeyId::Space`]        |
//! | `done`, `enter`     | [`KeyId::Submit`]       |
//! | anything else       | [`KeyId::Character`]    |

/// A resolved key identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyId {
    /// Removes the last buffered character.
    Backspace,
    /// Advances the caps state machine.
    Caps,
    /// Switches between the two layouts.
    Language,
    /// Appends a space.
    Space,
    /// Submits the buffered text.
    Submit,
    /// A layout key that appends its mapped character.
    Character(String),
}

impl KeyId {
    /// Returns `true` for keys that never need a character mapping.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !matches!(self, KeyId::Character(_))
    }

    /// Returns the canonical identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            KeyId::Backspace => "backspace",
            KeyId::Caps => "caps",
            KeyId::Language => "lang",
            KeyId::Space => "space",
            KeyId::Submit => "done",
            KeyId::Character(id) => id,
        }
    }
}

/// Parses a key identifier string.
///
/// Returns `None` for empty or whitespace-only identifiers.
///
/// # Examples
///
/// ```rust
/// use wordkiosk::input::{parse_key_id, KeyId};
///
/// assert_eq!(parse_key_id("enter"), Some(KeyId::Submit));
/// assert_eq!(parse_key_id("q"), Some(KeyId::Character("q".to_string())));
/// assert_eq!(parse_key_id(""), None);
/// ```
pub fn parse_key_id(raw: &str) -> Option<KeyId> {
    let id = raw.trim();
    if id.is_empty() {
        return None;
    }

    let key = match id {
        "backspace" => KeyId::Backspace,
        "caps" => KeyId::Caps,
        "lang" => KeyId::Language,
        "space" => KeyId::Space,
        // `enter` is the submit key of the simpler keyboard variant
        "done" | "enter" => KeyId::Submit,
        other => KeyId::Character(other.to_string()),
    };
    Some(key)
}
