// SPDX-License-Identifier: GPL-3.0-only

//! Input handling for the kiosk keyboard.
//!
//! # Features
//!
//! - **Key identifiers**: resolve layout strings into structural or character keys
//! - **Caps state**: shift-once and caps-lock with double-tap detection
//! - **Virtual keyboard**: buffered text, disablement policy and press events
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use wordkiosk::config::KioskConfig;
//! use wordkiosk::input::{KeyboardEvent, VirtualKeyboard};
//! use wordkiosk::layout::{default_layouts, KeyLayoutProvider};
//!
//! let config = KioskConfig::embedded()?.into_inner();
//! let provider = KeyLayoutProvider::new(default_layouts()?.into_inner());
//! let mut keyboard = VirtualKeyboard::new(provider, &config);
//! let mut events = keyboard.subscribe();
//!
//! keyboard.press("caps");
//! keyboard.press("h");
//! keyboard.press("i");
//! assert_eq!(keyboard.buffer(), "Hi");
//! ```

// Sub-modules
pub mod caps;
pub mod keyboard;
pub mod keycode;

// Re-export public API
pub use caps::{CapsMode, CapsState};
pub use keyboard::{KeyKind, KeyView, KeyboardEvent, SharedKeyboard, VirtualKeyboard};
pub use keycode::{KeyId, parse_key_id};

// ============================================================================
// Module Tests
// ============================================================================
