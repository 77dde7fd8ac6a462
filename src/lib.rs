// SPDX-License-Identifier: GPL-3.0-only

//! WordKiosk - A kiosk word-collection terminal
//!
//! A virtual on-screen keyboard feeds text into a simulated terminal, which
//! validates it, plays a short processing animation and submits the word to a
//! remote collection service.
//!
//! # Architecture
//!
//! ```text
//! key presses -> VirtualKeyboard --events--> CommandPipeline -> SubmissionClient -> service
//!                      ^                            |
//!                      +------ lock / unlock -------+
//! ```
//!
//! Everything runs on one thread. The keyboard reports each accepted press
//! over a channel; the pipeline locks the keyboard for the whole submission
//! cycle, so at most one word is ever in flight.
//!
//! # Modules
//!
//! - `app`: Keyboard and pipeline wiring plus the console surface
//! - `app_settings`: Centralized application constants
//! - `client`: Submission client, word polling and the HTTP transport
//! - `config`: Kiosk configuration with embedded defaults
//! - `input`: Key identifiers, caps state and the virtual keyboard
//! - `layout`: Key layout tables and character lookup
//! - `resources`: Embedded default documents
//! - `terminal`: Validation, history log and the submission pipeline

pub mod app;
pub mod app_settings;
pub mod client;
pub mod config;
pub mod input;
pub mod layout;
pub mod resources;
pub mod terminal;

// ============================================================================
// Integration Tests
// ============================================================================
