// SPDX-License-Identifier: GPL-3.0-only

//! Client for the remote word-collection service.
//!
//! - [`SubmissionClient`] submits words with bounded, linearly backed-off
//!   retries, either in place or through a parking queue
//! - [`WordsReceiver`] polls the approved word collection
//! - [`WordTransport`] is the single-attempt seam; [`HttpTransport`] speaks
//!   JSON over HTTP
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use wordkiosk::client::{HttpTransport, SubmissionClient};
//! use wordkiosk::config::KioskConfig;
//!
//! let config = KioskConfig::embedded()?.into_inner();
//! let transport = HttpTransport::new(&config.api)?;
//! let mut client = SubmissionClient::new(transport, &config.api);
//!
//! client.submit("hello", false).await?;
//! let reply = client.fetch_words(100, true, "1970-01-01T00:00:00.000Z").await?;
//! ```

pub mod error;
pub mod receiver;
pub mod submission;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ClientError;
pub use receiver::WordsReceiver;
pub use submission::{DrainReport, SubmissionClient, SubmissionJob, SubmissionQueue, clean_word};
pub use transport::{
    HttpTransport, ReplyStatus, SubmitReply, WordPayload, WordRecord, WordTransport, WordsQuery,
    WordsReply, EPOCH_TIMESTAMP,
};
