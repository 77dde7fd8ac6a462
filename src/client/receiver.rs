// SPDX-License-Identifier: GPL-3.0-only

//! Periodic polling of the approved word collection.
//!
//! [`WordsReceiver`] asks the service for words newer than the last timestamp
//! it has seen and forwards each batch to its subscriber. Timestamps are
//! ISO-8601 strings in one fixed format, so they order lexicographically.

use crate::client::error::ClientError;
use crate::client::submission::SubmissionClient;
use crate::client::transport::{EPOCH_TIMESTAMP, WordRecord, WordTransport};
use crate::config::ApiConfig;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// Polls the service and forwards new words.
pub struct WordsReceiver<T> {
    client: SubmissionClient<T>,
    limit: usize,
    random: bool,
    polling_interval: Duration,
    since: String,
    subscriber: Option<UnboundedSender<Vec<WordRecord>>>,
}

impl<T: WordTransport> WordsReceiver<T> {
    pub fn new(client: SubmissionClient<T>, api: &ApiConfig) -> Self {
        Self {
            client,
            limit: api.default_words_limit,
            random: true,
            polling_interval: api.polling_interval(),
            since: EPOCH_TIMESTAMP.to_string(),
            subscriber: None,
        }
    }

    /// Overrides the per-request word limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Timestamp sent with the next request.
    pub fn since(&self) -> &str {
        &self.since
    }

    /// Replaces the current subscriber and returns its batch stream.
    pub fn subscribe(&mut self) -> UnboundedReceiver<Vec<WordRecord>> {
        let (tx, rx) = mpsc::unbounded();
        self.subscriber = Some(tx);
        rx
    }

    /// Fetches once, advances the timestamp and forwards the batch.
    pub async fn poll_once(&mut self) -> Result<Vec<WordRecord>, ClientError> {
        let reply = self
            .client
            .fetch_words(self.limit, self.random, &self.since)
            .await?;

        if let Some(latest) = reply
            .words
            .iter()
            .filter_map(|word| word.timestamp.as_deref())
            .max()
        {
            if latest > self.since.as_str() {
                self.since = latest.to_string();
            }
        }
        tracing::debug!("Received {} word(s), next since {}", reply.words.len(), self.since);

        if let Some(tx) = &self.subscriber {
            if tx.unbounded_send(reply.words.clone()).is_err() {
                tracing::debug!("Word subscriber went away");
                self.subscriber = None;
            }
        }
        Ok(reply.words)
    }

    /// Polls every polling interval until the subscriber goes away.
    ///
    /// The first poll happens immediately. Failed polls are logged and the
    /// next tick tries again.
    pub async fn run(mut self) {
        if self.subscriber.is_none() {
            tracing::warn!("Word receiver started without a subscriber");
            return;
        }

        let mut ticker = interval(self.polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.subscriber.is_some() {
            ticker.tick().await;
            if let Err(err) = self.poll_once().await {
                tracing::warn!("Word poll failed: {}", err);
            }
        }
    }
}
