// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk configuration.
//!
//! The configuration is loaded once at startup and shared immutably as
//! `Arc<KioskConfig>`. The bundled `kiosk.json` supplies every value; a file
//! given on the command line is merged over it, so it only needs the fields
//! it changes.
//!
//! All durations are milliseconds in JSON and `Duration` in code.

use crate::app_settings;
use crate::layout::{Language, ParseError, ParseResult, ValidationIssue};
use crate::layout::types::collect_issues;
use crate::resources;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete kiosk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskConfig {
    /// Optional layout table replacing the bundled one
    pub layouts_file: Option<PathBuf>,
    /// Virtual keyboard settings
    pub keyboard: KeyboardConfig,
    /// Terminal and submission pipeline settings
    pub terminal: TerminalConfig,
    /// Remote word-collection service settings
    pub api: ApiConfig,
    /// Message pools shown in the terminal history
    pub responses: ResponsePools,
}

/// Virtual keyboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Two caps taps closer than this lock caps
    pub double_tap_window_ms: u64,
    /// Layout active at startup
    pub default_language: Language,
}

impl KeyboardConfig {
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }
}

/// Terminal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// History entries retained after each cycle
    pub max_commands: usize,
    /// Prompt shown before the input line and echoed commands
    pub prompt: PromptConfig,
    /// Input length limits
    pub validation: ValidationConfig,
    /// Processing animation settings
    pub processing: ProcessingConfig,
}

/// Prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    pub user: String,
    pub prefix: String,
}

/// Input length limits, counted in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Fraction of `max_length` where the counter turns to warning
    pub warning_threshold: f64,
    /// Fraction of `max_length` where the counter turns to danger
    pub danger_threshold: f64,
}

/// Timing and message pools for the processing animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub step_delay_ms: u64,
    pub final_delay_ms: u64,
    pub cleanup_delay_ms: u64,
    pub error_delay_ms: u64,
    pub success_pause_ms: u64,
    pub min_step_count: usize,
    pub max_step_count: usize,
    /// Step shown when the submission failed
    pub failure_step: String,
    pub step_pool: Vec<String>,
    pub final_step_pool: Vec<String>,
}

impl ProcessingConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn final_delay(&self) -> Duration {
        Duration::from_millis(self.final_delay_ms)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }

    pub fn success_pause(&self) -> Duration {
        Duration::from_millis(self.success_pause_ms)
    }
}

/// How the submission client handles failed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    /// Retry in place; the call returns once all attempts are spent.
    #[default]
    Immediate,
    /// Park exhausted jobs at the tail of a queue for later passes.
    Queued,
}

/// Remote service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    pub mode: SubmitMode,
    /// Attempts per job per pass
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_delay`
    pub retry_delay_ms: u64,
    /// Pause between consecutive queued requests
    pub request_gap_ms: u64,
    /// Passes a queued job gets before it is dropped
    pub max_queue_passes: u32,
    pub timeout_ms: u64,
    pub polling_interval_ms: u64,
    pub default_words_limit: usize,
}

impl ApiConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_gap(&self) -> Duration {
        Duration::from_millis(self.request_gap_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

/// Category of a terminal message; selects the pool it is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Success,
    /// Input longer than the maximum length
    ValidationError,
    EmptyInput,
    TooShort,
    NetworkError,
}

/// Message pools, one per [`MessageCategory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePools {
    pub success: Vec<String>,
    pub validation_error: Vec<String>,
    pub empty_input: Vec<String>,
    pub too_short: Vec<String>,
    pub network_error: Vec<String>,
}

impl ResponsePools {
    /// Returns the pool for a category.
    pub fn pool(&self, category: MessageCategory) -> &[String] {
        match category {
            MessageCategory::Success => &self.success,
            MessageCategory::ValidationError => &self.validation_error,
            MessageCategory::EmptyInput => &self.empty_input,
            MessageCategory::TooShort => &self.too_short,
            MessageCategory::NetworkError => &self.network_error,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl KioskConfig {
    /// Loads the bundled configuration.
    pub fn embedded() -> Result<ParseResult<KioskConfig>, ParseError> {
        let value = embedded_value()?;
        let config: KioskConfig = serde_json::from_value(value).map_err(ParseError::json_error)?;
        validate_config(config)
    }

    /// Loads a configuration file merged over the bundled defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<ParseResult<KioskConfig>, ParseError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let text =
            fs::read_to_string(path).map_err(|e| ParseError::io_error_with_path(e, &display))?;
        Self::from_json_overlay(&text).map_err(|e| e.with_path(display))
    }

    /// Parses a JSON document merged over the bundled defaults.
    pub fn from_json_overlay(json: &str) -> Result<ParseResult<KioskConfig>, ParseError> {
        let overlay: Value = serde_json::from_str(json).map_err(ParseError::json_error)?;
        let mut value = embedded_value()?;
        merge_json(&mut value, overlay);

        let config: KioskConfig = serde_json::from_value(value).map_err(ParseError::json_error)?;
        validate_config(config)
    }

    /// Loads from `path` when given, otherwise the bundled configuration.
    pub fn load(path: Option<&Path>) -> Result<ParseResult<KioskConfig>, ParseError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }
}

fn embedded_value() -> Result<Value, ParseError> {
    let text = resources::load_text(app_settings::DEFAULT_CONFIG_RESOURCE)?;
    serde_json::from_str(&text).map_err(ParseError::json_error)
}

/// Recursively merges `overlay` into `base`. Objects merge key by key; any
/// other value replaces the base value.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validates a configuration and returns it with warnings.
pub fn validate_config(config: KioskConfig) -> Result<ParseResult<KioskConfig>, ParseError> {
    let mut issues = Vec::new();

    let validation = &config.terminal.validation;
    if validation.min_length > validation.max_length {
        issues.push(ValidationIssue::error(
            format!(
                "min_length ({}) is greater than max_length ({})",
                validation.min_length, validation.max_length
            ),
            "terminal.validation",
        ));
    }
    if validation.max_length == 0 {
        issues.push(ValidationIssue::error(
            "max_length must be at least 1",
            "terminal.validation.max_length",
        ));
    }
    for (name, value) in [
        ("warning_threshold", validation.warning_threshold),
        ("danger_threshold", validation.danger_threshold),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            issues.push(
                ValidationIssue::warning(
                    format!("{name} ({value}) is outside (0, 1]"),
                    format!("terminal.validation.{name}"),
                )
                .with_suggestion("Use a fraction of max_length such as 0.8"),
            );
        }
    }

    if config.terminal.max_commands == 0 {
        issues.push(ValidationIssue::error(
            "max_commands must be at least 1",
            "terminal.max_commands",
        ));
    }

    let processing = &config.terminal.processing;
    if processing.min_step_count > processing.max_step_count {
        issues.push(ValidationIssue::error(
            format!(
                "min_step_count ({}) is greater than max_step_count ({})",
                processing.min_step_count, processing.max_step_count
            ),
            "terminal.processing",
        ));
    }
    if processing.step_pool.len() < processing.max_step_count {
        issues.push(
            ValidationIssue::warning(
                format!(
                    "step_pool has {} entries but up to {} distinct steps are drawn",
                    processing.step_pool.len(),
                    processing.max_step_count
                ),
                "terminal.processing.step_pool",
            )
            .with_suggestion("Fewer steps than requested will be shown"),
        );
    }
    if processing.final_step_pool.is_empty() {
        issues.push(ValidationIssue::error(
            "final_step_pool is empty",
            "terminal.processing.final_step_pool",
        ));
    }

    let pools = [
        ("success", MessageCategory::Success),
        ("validation_error", MessageCategory::ValidationError),
        ("empty_input", MessageCategory::EmptyInput),
        ("too_short", MessageCategory::TooShort),
        ("network_error", MessageCategory::NetworkError),
    ];
    for (name, category) in pools {
        if config.responses.pool(category).is_empty() {
            issues.push(ValidationIssue::error(
                format!("Message pool '{name}' is empty"),
                format!("responses.{name}"),
            ));
        }
    }

    if config.api.max_retries == 0 {
        issues.push(ValidationIssue::error(
            "max_retries must be at least 1",
            "api.max_retries",
        ));
    }
    if config.api.mode == SubmitMode::Queued && config.api.max_queue_passes == 0 {
        issues.push(ValidationIssue::error(
            "max_queue_passes must be at least 1 in queued mode",
            "api.max_queue_passes",
        ));
    }
    if config.api.endpoint.trim().is_empty() {
        issues.push(ValidationIssue::warning("Endpoint is empty", "api.endpoint"));
    }

    collect_issues(config, issues)
}

// ============================================================================
// Tests
// ============================================================================
