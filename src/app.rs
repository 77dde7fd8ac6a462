// SPDX-License-Identifier: GPL-3.0-only

//! The kiosk application.
//!
//! [`KioskApp`] owns one keyboard and one pipeline and connects them with the
//! keyboard's event channel. Everything runs on a single thread: the pipeline
//! is a local task and the keyboard is shared through `Rc<RefCell<_>>`, so
//! [`KioskApp::run`] must be awaited inside a `tokio::task::LocalSet`.
//!
//! Key presses come from a line-oriented source. Each whitespace-separated
//! token on a line is one key identifier (`h e l l o done`). A token that is
//! not a structural key is typed as text, so `hello done` works as well.

use crate::client::{ClientError, SubmissionClient, WordTransport};
use crate::config::KioskConfig;
use crate::input::{KeyId, KeyKind, KeyView, SharedKeyboard, VirtualKeyboard, parse_key_id};
use crate::layout::{KeyLayoutProvider, LayoutSet, ParseError};
use crate::terminal::{
    CharCountLevel, CommandPipeline, CycleOutcome, History, HistoryEntry, InputLine, StepState,
    TerminalSurface,
};
use futures::StreamExt;
use futures::channel::mpsc::UnboundedReceiver;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinHandle};

// ============================================================================
// Errors
// ============================================================================

/// Error that stops the application.
#[derive(Debug)]
pub enum AppError {
    /// Configuration or layout loading failed
    Config(ParseError),
    /// The service client could not be set up or a request failed
    Client(ClientError),
    /// Reading key presses failed
    Input(std::io::Error),
    /// The pipeline task panicked
    Task(JoinError),
    /// The pipeline stopped while key presses were still arriving
    PipelineStopped,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "Configuration error: {}", err),
            AppError::Client(err) => write!(f, "Client error: {}", err),
            AppError::Input(err) => write!(f, "Input error: {}", err),
            AppError::Task(err) => write!(f, "Pipeline task failed: {}", err),
            AppError::PipelineStopped => write!(f, "Pipeline stopped unexpectedly"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Client(err) => Some(err),
            AppError::Input(err) => Some(err),
            AppError::Task(err) => Some(err),
            AppError::PipelineStopped => None,
        }
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::Config(err)
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::Client(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Input(err)
    }
}

// ============================================================================
// Application
// ============================================================================

/// Keyboard and pipeline wired together.
pub struct KioskApp<T, S> {
    keyboard: SharedKeyboard,
    pipeline: CommandPipeline<T, S>,
}

impl<T, S> KioskApp<T, S>
where
    T: WordTransport + 'static,
    S: TerminalSurface + 'static,
{
    pub fn new(config: Arc<KioskConfig>, layouts: LayoutSet, transport: T, surface: S) -> Self {
        let keyboard =
            VirtualKeyboard::new(KeyLayoutProvider::new(layouts), &config).into_shared();
        let client = SubmissionClient::new(transport, &config.api);
        let pipeline =
            CommandPipeline::new(config, SharedKeyboard::clone(&keyboard), client, surface);

        Self { keyboard, pipeline }
    }

    pub fn keyboard(&self) -> &SharedKeyboard {
        &self.keyboard
    }

    /// Feeds key presses from `input` until it ends, then stops the
    /// pipeline and returns it.
    ///
    /// Reading pauses while a submission cycle is in flight.
    pub async fn run<R>(self, input: R) -> Result<CommandPipeline<T, S>, AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        let KioskApp {
            keyboard,
            mut pipeline,
        } = self;

        let events = keyboard.borrow_mut().subscribe();
        let mut finished = pipeline.subscribe_finished();
        let mut task = tokio::task::spawn_local(async move {
            pipeline.run(events).await;
            pipeline
        });
        tracing::info!("Kiosk ready");

        let fed = feed_keys(&keyboard, input, &mut finished, &mut task).await;
        keyboard.borrow_mut().unsubscribe();
        fed?;
        let pipeline = task.await.map_err(AppError::Task)?;

        tracing::info!("Input ended, kiosk stopped");
        Ok(pipeline)
    }
}

/// Presses every whitespace-separated token of `input` in order. After an
/// accepted submit, waits for the pipeline to report the end of the cycle.
async fn feed_keys<R, P>(
    keyboard: &SharedKeyboard,
    input: R,
    finished: &mut UnboundedReceiver<CycleOutcome>,
    task: &mut JoinHandle<P>,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        for token in line.split_whitespace() {
            if !keyboard.borrow_mut().press(token) {
                tracing::debug!("Key '{}' ignored", token);
                continue;
            }
            if parse_key_id(token) != Some(KeyId::Submit) {
                // Let the pipeline see the event before the next press
                tokio::task::yield_now().await;
                continue;
            }

            match finished.next().await {
                Some(outcome) => tracing::debug!("Cycle finished: {:?}", outcome),
                // The pipeline was dropped mid-cycle
                None => {
                    return Err(match task.await {
                        Err(err) => AppError::Task(err),
                        Ok(_) => AppError::PipelineStopped,
                    });
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Console surface
// ============================================================================

/// Surface that redraws the terminal as plain text on a writer.
pub struct ConsoleSurface<W> {
    writer: W,
    history: Vec<String>,
    input: String,
    keys: Vec<String>,
    clear_screen: bool,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            history: Vec::new(),
            input: String::new(),
            keys: Vec::new(),
            clear_screen: false,
        }
    }

    /// Clears the screen with ANSI escapes before each frame.
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn redraw(&mut self) {
        if let Err(err) = self.write_frame() {
            tracing::warn!("Failed to draw terminal: {}", err);
        }
    }

    fn write_frame(&mut self) -> std::io::Result<()> {
        if self.clear_screen {
            write!(self.writer, "\x1b[2J\x1b[H")?;
        }
        for line in &self.history {
            writeln!(self.writer, "{}", line)?;
        }
        writeln!(self.writer, "{}", self.input)?;
        for row in &self.keys {
            writeln!(self.writer, "{}", row)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

fn format_entry(entry: &HistoryEntry) -> String {
    match entry {
        HistoryEntry::EchoedCommand(text) => text.clone(),
        HistoryEntry::Step(step) => match step.state {
            StepState::Active => format!("  {} ...", step.text),
            StepState::Inactive => format!("  {}", step.text),
            StepState::Fading => format!("  ({})", step.text),
        },
        HistoryEntry::ErrorMessage { text, .. } => format!("! {}", text),
        HistoryEntry::SuccessMessage(text) => format!("> {}", text),
    }
}

fn format_input(line: &InputLine) -> String {
    let marker = match line.level {
        CharCountLevel::Normal => "",
        CharCountLevel::Warning => " !",
        CharCountLevel::Danger => " !!",
    };
    let cursor = if line.processing { "" } else { "_" };
    format!(
        "{} {}{}{} [{}{}]",
        line.user,
        line.prefix,
        line.text,
        cursor,
        line.counter(),
        marker
    )
}

fn format_keys(keys: &[KeyView]) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = Vec::new();

    for key in keys {
        let label = if key.kind == KeyKind::Caps && key.caps_mode.is_some_and(|m| m.is_upper()) {
            format!("{}*", key.label)
        } else {
            key.label.clone()
        };
        row.push(if key.disabled {
            format!("({})", label)
        } else {
            label
        });
        if key.row_break {
            rows.push(row.join(" "));
            row.clear();
        }
    }
    if !row.is_empty() {
        rows.push(row.join(" "));
    }
    rows
}

impl<W: Write> TerminalSurface for ConsoleSurface<W> {
    fn render_history(&mut self, history: &History) {
        self.history = history.entries().map(format_entry).collect();
        self.redraw();
    }

    fn render_input(&mut self, line: &InputLine) {
        self.input = format_input(line);
        self.redraw();
    }

    fn render_keyboard(&mut self, keys: &[KeyView]) {
        self.keys = format_keys(keys);
        self.redraw();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::config::MessageCategory;
    use crate::layout::default_layouts;
    use tokio::task::LocalSet;

    fn app(transport: &FakeTransport) -> KioskApp<FakeTransport, ConsoleSurface<Vec<u8>>> {
        let config = Arc::new(KioskConfig::embedded().unwrap().into_inner());
        let layouts = default_layouts().unwrap().into_inner();
        KioskApp::new(config, layouts, transport.clone(), ConsoleSurface::new(Vec::new()))
    }

    /// Test 1: Two words typed on separate lines are both submitted
    #[tokio::test(start_paused = true)]
    async fn test_run_submits_each_line() {
        let transport = FakeTransport::new();
        let app = app(&transport);
        let input: &[u8] = b"caps h e l l o done\nworld done\n";

        let pipeline = LocalSet::new()
            .run_until(app.run(input))
            .await
            .unwrap();

        let values: Vec<String> = transport.posted().into_iter().map(|p| p.value).collect();
        assert_eq!(values, ["Hello", "world"]);
        assert_eq!(
            pipeline.history().count_category(MessageCategory::Success),
            2
        );

        let output = String::from_utf8(pipeline.surface().writer().clone()).unwrap();
        assert!(output.contains("gdf-user $ Hello"));
        assert!(output.contains("gdf-user $ world"));
    }

    /// Test 2: Rejected keys are skipped without stopping the run
    #[tokio::test(start_paused = true)]
    async fn test_run_skips_rejected_keys() {
        let transport = FakeTransport::new();
        let app = app(&transport);
        let input: &[u8] = b"a done\nb c done\n";

        let pipeline = LocalSet::new()
            .run_until(app.run(input))
            .await
            .unwrap();

        let values: Vec<String> = transport.posted().into_iter().map(|p| p.value).collect();
        assert_eq!(values, ["abc"]);
        assert_eq!(pipeline.history().len(), 2);
    }

    /// Test 3: Console formatting of keys and the prompt line
    #[test]
    fn test_console_formatting() {
        let config = KioskConfig::embedded().unwrap().into_inner();
        let layouts = default_layouts().unwrap().into_inner();
        let mut keyboard = VirtualKeyboard::new(KeyLayoutProvider::new(layouts), &config);
        keyboard.press("caps");

        let rows = format_keys(&keyboard.keys());
        assert!(rows.len() > 1);
        assert!(rows.iter().any(|row| row.contains("⇧*")));
        assert!(rows.iter().any(|row| row.contains("(done)")));

        for key in ["h", "e", "l", "l", "o", "w", "o", "r", "l", "d", "x", "y"] {
            keyboard.press(key);
        }
        let line = InputLine::new(&keyboard, &config.terminal);
        assert_eq!(format_input(&line), "gdf-user $ Helloworldxy_ [12/15 !]");
    }

    /// Test 4: A pipeline that dies mid-cycle is reported instead of hanging
    #[tokio::test(start_paused = true)]
    async fn test_run_reports_dead_pipeline() {
        let transport = FakeTransport::new();
        transport.set_hook(|_| panic!("transport exploded"));
        let app = app(&transport);
        let keyboard = SharedKeyboard::clone(app.keyboard());
        let input: &[u8] = b"a b done
c d done
";

        let result = LocalSet::new().run_until(app.run(input)).await;

        match result {
            Err(AppError::Task(err)) => assert!(err.is_panic()),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("run should fail"),
        }
        assert_eq!(transport.post_count(), 1);
        // The second line was never typed
        assert_eq!(keyboard.borrow().buffer(), "ab");
    }
}
