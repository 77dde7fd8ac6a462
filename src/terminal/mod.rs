// SPDX-License-Identifier: GPL-3.0-only

//! The simulated terminal: validation, the processing animation and the
//! bounded history log.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wordkiosk::terminal::{CommandPipeline, NullSurface};
//!
//! let mut pipeline = CommandPipeline::new(Arc::new(config), keyboard, client, NullSurface);
//! let events = keyboard_handle.borrow_mut().subscribe();
//! pipeline.run(events).await;
//! ```

pub mod history;
pub mod pipeline;
pub mod surface;
pub mod validation;

pub use crate::config::MessageCategory;
pub use history::{History, HistoryEntry, ProcessingStep, StepState};
pub use pipeline::{CommandPipeline, CycleOutcome, PipelinePhase};
pub use surface::{CharCountLevel, InputLine, NullSurface, TerminalSurface};
pub use validation::{ValidationError, validate_input};
