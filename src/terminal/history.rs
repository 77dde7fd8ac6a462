// SPDX-License-Identifier: GPL-3.0-only

//! The terminal's display log.
//!
//! The log holds retained [`HistoryEntry`] lines plus the transient processing
//! steps of the cycle in flight. Steps are the only entries whose state
//! changes after they are pushed; every other entry is immutable.

use crate::config::MessageCategory;
use std::collections::VecDeque;

/// Lifecycle of a processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Shown with its running animation
    Active,
    /// Still listed, animation stopped
    Inactive,
    /// Fading out before removal
    Fading,
}

/// Transient message shown while a submission is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingStep {
    pub id: u64,
    pub text: String,
    pub state: StepState,
}

/// One line of the terminal log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// The submitted command, prompt included
    EchoedCommand(String),
    Step(ProcessingStep),
    ErrorMessage {
        category: MessageCategory,
        text: String,
    },
    SuccessMessage(String),
}

impl HistoryEntry {
    pub fn is_step(&self) -> bool {
        matches!(self, HistoryEntry::Step(_))
    }

    /// Category of a message entry.
    pub fn category(&self) -> Option<MessageCategory> {
        match self {
            HistoryEntry::ErrorMessage { category, .. } => Some(*category),
            HistoryEntry::SuccessMessage(_) => Some(MessageCategory::Success),
            _ => None,
        }
    }

    /// Text shown for the entry.
    pub fn text(&self) -> &str {
        match self {
            HistoryEntry::EchoedCommand(text)
            | HistoryEntry::ErrorMessage { text, .. }
            | HistoryEntry::SuccessMessage(text) => text,
            HistoryEntry::Step(step) => &step.text,
        }
    }
}

/// Bounded FIFO log of entries.
///
/// The bound is applied by [`History::trim`] at the end of each cycle, so a
/// cycle in flight may temporarily exceed it.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
    next_step_id: u64,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
            next_step_id: 0,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
    }

    /// Appends a step and returns its id.
    pub fn push_step(&mut self, text: impl Into<String>, state: StepState) -> u64 {
        let id = self.next_step_id;
        self.next_step_id += 1;
        self.entries.push_back(HistoryEntry::Step(ProcessingStep {
            id,
            text: text.into(),
            state,
        }));
        id
    }

    /// Changes the state of one step. Returns `false` if no such step is listed.
    pub fn set_step_state(&mut self, id: u64, state: StepState) -> bool {
        match self.steps_mut().find(|step| step.id == id) {
            Some(step) => {
                step.state = state;
                true
            }
            None => false,
        }
    }

    /// Changes the state of every listed step.
    pub fn mark_steps(&mut self, state: StepState) {
        for step in self.steps_mut() {
            step.state = state;
        }
    }

    /// Removes every step and returns how many were removed.
    pub fn remove_steps(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_step());
        before - self.entries.len()
    }

    /// Evicts the oldest entries beyond the bound and returns how many went.
    pub fn trim(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.max_entries);
        self.entries.drain(..excess);
        excess
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn steps(&self) -> impl Iterator<Item = &ProcessingStep> {
        self.entries.iter().filter_map(|entry| match entry {
            HistoryEntry::Step(step) => Some(step),
            _ => None,
        })
    }

    fn steps_mut(&mut self) -> impl Iterator<Item = &mut ProcessingStep> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            HistoryEntry::Step(step) => Some(step),
            _ => None,
        })
    }

    /// Number of message entries of one category.
    pub fn count_category(&self, category: MessageCategory) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.category() == Some(category))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
