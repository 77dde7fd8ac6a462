// SPDX-License-Identifier: GPL-3.0-only

//! The rendering seam.
//!
//! Drawing is done by an external surface. The pipeline hands it snapshots
//! after every change; nothing a surface does feeds back into the state
//! machines.

use crate::config::TerminalConfig;
use crate::input::{KeyView, VirtualKeyboard};
use crate::terminal::history::History;

/// Colour level of the character counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharCountLevel {
    #[default]
    Normal,
    Warning,
    Danger,
}

impl CharCountLevel {
    /// Level for `count` characters out of `max`.
    pub fn for_count(count: usize, max: usize, warning: f64, danger: f64) -> Self {
        if max == 0 {
            return CharCountLevel::Danger;
        }
        let ratio = count as f64 / max as f64;
        if ratio >= danger {
            CharCountLevel::Danger
        } else if ratio >= warning {
            CharCountLevel::Warning
        } else {
            CharCountLevel::Normal
        }
    }
}

/// Snapshot of the prompt line.
#[derive(Debug, Clone, PartialEq)]
pub struct InputLine {
    pub user: String,
    pub prefix: String,
    pub text: String,
    pub processing: bool,
    pub count: usize,
    pub max: usize,
    pub level: CharCountLevel,
}

impl InputLine {
    /// Builds the prompt line for the keyboard's current buffer.
    pub fn new(keyboard: &VirtualKeyboard, terminal: &TerminalConfig) -> Self {
        let text = keyboard.buffer().to_string();
        let count = text.chars().count();
        let limits = &terminal.validation;

        Self {
            user: terminal.prompt.user.clone(),
            prefix: terminal.prompt.prefix.clone(),
            level: CharCountLevel::for_count(
                count,
                limits.max_length,
                limits.warning_threshold,
                limits.danger_threshold,
            ),
            text,
            processing: keyboard.is_processing(),
            count,
            max: limits.max_length,
        }
    }

    /// The counter as shown, e.g. `5/15`.
    pub fn counter(&self) -> String {
        format!("{}/{}", self.count, self.max)
    }
}

/// External rendering surface.
pub trait TerminalSurface {
    /// Redraws the log.
    fn render_history(&mut self, history: &History);

    /// Redraws the prompt line.
    fn render_input(&mut self, line: &InputLine);

    /// Redraws the key labels and their enabled state.
    fn render_keyboard(&mut self, keys: &[KeyView]);
}

/// Surface that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl TerminalSurface for NullSurface {
    fn render_history(&mut self, _history: &History) {}

    fn render_input(&mut self, _line: &InputLine) {}

    fn render_keyboard(&mut self, _keys: &[KeyView]) {}
}
