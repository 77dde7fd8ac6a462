// SPDX-License-Identifier: GPL-3.0-only

//! Default documents embedded in the binary.

use crate::layout::ParseError;
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "resources/"]
struct Resources;

/// Returns an embedded resource as UTF-8 text.
pub fn load_text(name: &str) -> Result<String, ParseError> {
    let file = Resources::get(name).ok_or_else(|| ParseError::MissingResource {
        name: name.to_string(),
    })?;
    String::from_utf8(file.data.into_owned()).map_err(|_| ParseError::MissingResource {
        name: format!("{name} (not UTF-8)"),
    })
}
