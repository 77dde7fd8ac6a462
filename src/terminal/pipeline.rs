// SPDX-License-Identifier: GPL-3.0-only

//! One submission cycle, from submit press to idle.
//!
//! ```text
//! Idle -> Validating -> Animating -> Submitting -> CleaningUp -> Idle
//!             |                          |
//!             +-- rejected --------------+-- failed ----------> Idle
//! ```
//!
//! The keyboard is locked for the whole cycle, which keeps at most one
//! submission in flight. The final processing step and the network request
//! run together and the slower of the two gates the next phase.

use crate::client::{ClientError, SubmissionClient, WordTransport, clean_word};
use crate::config::{KioskConfig, MessageCategory};
use crate::input::{KeyboardEvent, SharedKeyboard};
use crate::terminal::history::{History, HistoryEntry, StepState};
use crate::terminal::surface::{InputLine, TerminalSurface};
use crate::terminal::validation::{ValidationError, validate_input};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::time::sleep;

/// Phase of the submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePhase {
    #[default]
    Idle,
    Validating,
    Animating,
    Submitting,
    CleaningUp,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Rejected locally; nothing was sent
    Rejected(ValidationError),
    /// The service accepted the word
    Submitted,
    /// The submission failed after all retries
    Failed(ClientError),
}

/// Drives submission cycles for one keyboard.
pub struct CommandPipeline<T, S> {
    config: Arc<KioskConfig>,
    keyboard: SharedKeyboard,
    client: SubmissionClient<T>,
    surface: S,
    history: History,
    phase: PipelinePhase,
    rng: StdRng,
    finished: Option<UnboundedSender<CycleOutcome>>,
}

impl<T: WordTransport, S: TerminalSurface> CommandPipeline<T, S> {
    pub fn new(
        config: Arc<KioskConfig>,
        keyboard: SharedKeyboard,
        client: SubmissionClient<T>,
        surface: S,
    ) -> Self {
        Self {
            history: History::new(config.terminal.max_commands),
            config,
            keyboard,
            client,
            surface,
            phase: PipelinePhase::Idle,
            rng: StdRng::from_entropy(),
            finished: None,
        }
    }

    /// Replaces the random source used for message and step picks.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn client_mut(&mut self) -> &mut SubmissionClient<T> {
        &mut self.client
    }

    /// Returns a stream that yields the outcome of every cycle started by a
    /// keyboard event. The stream ends when the pipeline is dropped.
    pub fn subscribe_finished(&mut self) -> UnboundedReceiver<CycleOutcome> {
        let (tx, rx) = mpsc::unbounded();
        self.finished = Some(tx);
        rx
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Handles keyboard events until the keyboard drops its subscriber.
    pub async fn run(&mut self, mut events: UnboundedReceiver<KeyboardEvent>) {
        self.render_all();
        while let Some(event) = events.next().await {
            self.handle_event(event).await;
        }
        tracing::debug!("Keyboard event stream ended");
    }

    /// Handles one keyboard event.
    pub async fn handle_event(&mut self, event: KeyboardEvent) {
        match event {
            KeyboardEvent::InputChanged(_) => self.render_input(),
            KeyboardEvent::LayoutChanged => self.render_keyboard(),
            KeyboardEvent::Submitted(text) => {
                let outcome = self.process_command(&text).await;
                if let Some(tx) = &self.finished {
                    if tx.unbounded_send(outcome).is_err() {
                        self.finished = None;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Submission cycle
    // ========================================================================

    /// Runs one full cycle for `raw` and returns the keyboard to idle.
    pub async fn process_command(&mut self, raw: &str) -> CycleOutcome {
        {
            let mut keyboard = self.keyboard.borrow_mut();
            keyboard.set_processing(true);
            keyboard.set_enabled(false);
        }
        self.phase = PipelinePhase::Validating;
        self.render_input();
        self.render_keyboard();

        let text = match self.validate(raw) {
            Ok(text) => text,
            Err(err) => {
                tracing::info!("Rejected input: {}", err);
                let text = self.pick(err.category());
                self.history.push(HistoryEntry::ErrorMessage {
                    category: err.category(),
                    text,
                });
                self.finish();
                return CycleOutcome::Rejected(err);
            }
        };

        tracing::info!("Processing '{}'", text);
        self.phase = PipelinePhase::Animating;
        let echo = format!(
            "{} {}{}",
            self.config.terminal.prompt.user, self.config.terminal.prompt.prefix, raw
        );
        self.history.push(HistoryEntry::EchoedCommand(echo));
        self.render_history();

        let step_delay = self.config.terminal.processing.step_delay();
        for step in self.select_steps() {
            let id = self.history.push_step(step, StepState::Active);
            self.render_history();
            sleep(step_delay).await;
            self.history.set_step_state(id, StepState::Inactive);
        }

        self.phase = PipelinePhase::Submitting;
        let final_step = self.pick_final_step();
        let final_id = self.history.push_step(final_step, StepState::Active);
        self.render_history();

        let final_delay = self.config.terminal.processing.final_delay();
        let (_, result) = tokio::join!(sleep(final_delay), self.client.submit(&text, false));
        self.history.set_step_state(final_id, StepState::Inactive);

        let outcome = match result {
            Ok(_) => {
                self.clean_up_success().await;
                CycleOutcome::Submitted
            }
            Err(err) => {
                self.report_failure(&err).await;
                CycleOutcome::Failed(err)
            }
        };

        self.finish();
        outcome
    }

    fn validate(&self, raw: &str) -> Result<String, ValidationError> {
        let text = validate_input(raw, &self.config.terminal.validation)?;
        if clean_word(text).is_empty() {
            return Err(ValidationError::Empty);
        }
        Ok(text.to_string())
    }

    async fn clean_up_success(&mut self) {
        let processing = &self.config.terminal.processing;
        let (cleanup_delay, success_pause) =
            (processing.cleanup_delay(), processing.success_pause());

        self.phase = PipelinePhase::CleaningUp;
        self.history.mark_steps(StepState::Fading);
        self.render_history();
        sleep(cleanup_delay).await;

        let removed = self.history.remove_steps();
        tracing::debug!("Removed {} processing step(s)", removed);
        self.render_history();
        sleep(success_pause).await;

        let text = self.pick(MessageCategory::Success);
        self.history.push(HistoryEntry::SuccessMessage(text));
        tracing::info!("Submission cycle succeeded");
    }

    async fn report_failure(&mut self, err: &ClientError) {
        match err {
            ClientError::Transport(_) => tracing::warn!("Submission failed in transport: {}", err),
            ClientError::Server { .. } | ClientError::InvalidResponse(_) => {
                tracing::warn!("Submission rejected by the service: {}", err)
            }
            ClientError::EmptyAfterCleanup => tracing::warn!("Submission had no content: {}", err),
        }

        let failure_step = self.config.terminal.processing.failure_step.clone();
        self.history.push_step(failure_step, StepState::Inactive);
        self.render_history();
        sleep(self.config.terminal.processing.error_delay()).await;

        let category = match err {
            ClientError::EmptyAfterCleanup => MessageCategory::EmptyInput,
            _ => MessageCategory::NetworkError,
        };
        let text = self.pick(category);
        self.history.push(HistoryEntry::ErrorMessage { category, text });
    }

    /// Trims the log and hands the keyboard back.
    fn finish(&mut self) {
        let evicted = self.history.trim();
        if evicted > 0 {
            tracing::debug!("Evicted {} history entr(ies)", evicted);
        }
        {
            let mut keyboard = self.keyboard.borrow_mut();
            keyboard.clear();
            keyboard.set_processing(false);
            keyboard.set_enabled(true);
        }
        self.phase = PipelinePhase::Idle;
        self.render_all();
    }

    // ========================================================================
    // Random picks
    // ========================================================================

    fn pick(&mut self, category: MessageCategory) -> String {
        self.config
            .responses
            .pool(category)
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }

    fn pick_final_step(&mut self) -> String {
        self.config
            .terminal
            .processing
            .final_step_pool
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Draws between `min_step_count` and `max_step_count` distinct steps.
    fn select_steps(&mut self) -> Vec<String> {
        let processing = &self.config.terminal.processing;
        let (min, max) = (processing.min_step_count, processing.max_step_count);
        let count = if min >= max {
            min
        } else {
            self.rng.gen_range(min..=max)
        };

        let steps: Vec<String> = processing
            .step_pool
            .choose_multiple(&mut self.rng, count)
            .cloned()
            .collect();
        tracing::debug!("Selected {} processing step(s): {:?}", steps.len(), steps);
        steps
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render_history(&mut self) {
        self.surface.render_history(&self.history);
    }

    fn render_input(&mut self) {
        let line = InputLine::new(&self.keyboard.borrow(), &self.config.terminal);
        self.surface.render_input(&line);
    }

    fn render_keyboard(&mut self) {
        let keys = self.keyboard.borrow().keys();
        self.surface.render_keyboard(&keys);
    }

    fn render_all(&mut self) {
        self.render_history();
        self.render_input();
        self.render_keyboard();
    }
}

// ============================================================================
// Tests
// ============================================================================
