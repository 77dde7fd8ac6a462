// SPDX-License-Identifier: GPL-3.0-only

//! Caps state management for keyboard input.
//!
//! The caps key behaves like a phone keyboard shift key:
//!
//! - **Shift once**: a single tap upper-cases exactly the next character
//! - **Caps lock**: a second tap within the double-tap window locks upper case
//! - **Normal**: any other tap returns to lower case
//!
//! ```text
//! Normal    --tap-->                    ShiftOnce
//! ShiftOnce --tap within window-->      CapsLock
//! ShiftOnce --tap after window-->       Normal
//! ShiftOnce --character typed-->        Normal
//! CapsLock  --tap-->                    Normal
//! ```
//!
//! Only caps taps move the double-tap timer; other keys never reset it.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use wordkiosk::input::{CapsMode, CapsState};
//!
//! let mut caps = CapsState::new(Duration::from_millis(300));
//! let t0 = Instant::now();
//!
//! caps.tap(t0);
//! caps.tap(t0 + Duration::from_millis(100));
//! assert_eq!(caps.mode(), CapsMode::CapsLock);
//! ```

use std::time::{Duration, Instant};

/// The three caps modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapsMode {
    /// Lower case
    #[default]
    Normal,
    /// Upper case for the next character only
    ShiftOnce,
    /// Upper case until the caps key is tapped again
    CapsLock,
}

impl CapsMode {
    /// Returns `true` if characters are currently upper-cased.
    #[must_use]
    pub fn is_upper(self) -> bool {
        !matches!(self, CapsMode::Normal)
    }
}

/// Tracks the caps mode and the time of the last caps tap.
#[derive(Debug, Clone)]
pub struct CapsState {
    /// Current mode
    mode: CapsMode,

    /// When the caps key was last tapped
    last_tap: Option<Instant>,

    /// Maximum gap between two taps that counts as a double tap
    double_tap_window: Duration,
}

impl CapsState {
    /// Creates a new `CapsState` in [`CapsMode::Normal`].
    #[must_use]
    pub fn new(double_tap_window: Duration) -> Self {
        Self {
            mode: CapsMode::Normal,
            last_tap: None,
            double_tap_window,
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> CapsMode {
        self.mode
    }

    /// Returns `true` if characters are currently upper-cased.
    #[must_use]
    pub fn is_upper(&self) -> bool {
        self.mode.is_upper()
    }

    /// Handles a tap on the caps key at time `now` and returns the new mode.
    ///
    /// A tap arriving within the double-tap window of the previous tap while
    /// in shift-once mode locks caps rather than toggling it off.
    pub fn tap(&mut self, now: Instant) -> CapsMode {
        let previous = self.mode;
        let within_window = self
            .last_tap
            .is_some_and(|last| now.saturating_duration_since(last) < self.double_tap_window);

        self.mode = match self.mode {
            CapsMode::ShiftOnce if within_window => CapsMode::CapsLock,
            CapsMode::Normal => CapsMode::ShiftOnce,
            CapsMode::ShiftOnce | CapsMode::CapsLock => CapsMode::Normal,
        };
        self.last_tap = Some(now);

        tracing::debug!(
            "Caps mode changed: {:?} -> {:?} (double tap: {})",
            previous,
            self.mode,
            within_window
        );
        self.mode
    }

    /// Consumes a pending shift-once after a character was typed.
    ///
    /// Returns `true` if the mode changed.
    pub fn consume_shift(&mut self) -> bool {
        if self.mode == CapsMode::ShiftOnce {
            tracing::debug!("Shift-once consumed by character");
            self.mode = CapsMode::Normal;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
