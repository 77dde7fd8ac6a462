// SPDX-License-Identifier: GPL-3.0-only

//! Centralized application settings and constants.

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("wordkiosk/", env!("CARGO_PKG_VERSION"));

/// Default tracing directive when `RUST_LOG` does not mention the crate.
pub const LOG_DIRECTIVE: &str = "wordkiosk=info";

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "WORDKIOSK_CONFIG";

/// Environment variable overriding the service endpoint.
pub const ENDPOINT_ENV: &str = "WORDKIOSK_ENDPOINT";

/// Embedded default configuration.
pub const DEFAULT_CONFIG_RESOURCE: &str = "kiosk.json";

/// Embedded default layout table.
pub const DEFAULT_LAYOUTS_RESOURCE: &str = "layouts.json";
