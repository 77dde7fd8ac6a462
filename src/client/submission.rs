// SPDX-License-Identifier: GPL-3.0-only

//! Word submission with bounded retries.
//!
//! Every request is attempted up to `max_retries` times. After failed
//! attempt `n` the client waits `n * retry_delay` before the next one.
//!
//! In [`SubmitMode::Immediate`] the retries happen in place and `submit`
//! returns the final outcome. In [`SubmitMode::Queued`] each word becomes a
//! [`SubmissionJob`] at the tail of a FIFO queue. A drain pass gives every
//! queued job its retries; jobs that exhaust them move back to the tail, and
//! a job is dropped once it has used up `max_queue_passes` passes.

use crate::client::error::ClientError;
use crate::client::transport::{
    ReplyStatus, SubmitReply, WordPayload, WordTransport, WordsQuery, WordsReply,
};
use crate::config::{ApiConfig, SubmitMode};
use std::collections::VecDeque;
use std::future::Future;
use tokio::time::sleep;

/// Removes `<...>` markup and surrounding whitespace.
///
/// An unterminated `<` is kept as text.
///
/// # Examples
///
/// ```rust
/// use wordkiosk::client::clean_word;
///
/// assert_eq!(clean_word("  <b>hello</b> "), "hello");
/// assert_eq!(clean_word("a < b"), "a < b");
/// ```
pub fn clean_word(word: &str) -> String {
    let mut cleaned = String::with_capacity(word.len());
    let mut rest = word;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        cleaned.push_str(&rest[..start]);
        rest = &rest[start + len + 1..];
    }
    cleaned.push_str(rest);

    cleaned.trim().to_string()
}

// ============================================================================
// Queue
// ============================================================================

/// One word waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionJob {
    pub id: u64,
    pub payload: WordPayload,
    /// Drain passes this job has failed
    pub passes: u32,
}

/// FIFO of undelivered jobs.
#[derive(Debug, Default)]
pub struct SubmissionQueue {
    jobs: VecDeque<SubmissionJob>,
}

impl SubmissionQueue {
    pub fn push(&mut self, job: SubmissionJob) {
        self.jobs.push_back(job);
    }

    pub fn pop(&mut self) -> Option<SubmissionJob> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubmissionJob> {
        self.jobs.iter()
    }
}

/// Result of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    /// Jobs moved back to the tail
    pub parked: usize,
    /// Jobs dropped after their last pass
    pub dropped: usize,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the word-collection service.
#[derive(Debug)]
pub struct SubmissionClient<T> {
    transport: T,
    api: ApiConfig,
    queue: SubmissionQueue,
    next_job_id: u64,
}

impl<T: WordTransport> SubmissionClient<T> {
    pub fn new(transport: T, api: &ApiConfig) -> Self {
        Self {
            transport,
            api: api.clone(),
            queue: SubmissionQueue::default(),
            next_job_id: 0,
        }
    }

    pub fn mode(&self) -> SubmitMode {
        self.api.mode
    }

    pub fn queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    /// Submits one word.
    ///
    /// Fails with [`ClientError::EmptyAfterCleanup`] without any request when
    /// nothing remains after cleaning. Otherwise returns the outcome of the
    /// last attempt made for this word.
    pub async fn submit(&mut self, word: &str, verified: bool) -> Result<SubmitReply, ClientError> {
        let value = clean_word(word);
        if value.is_empty() {
            return Err(ClientError::EmptyAfterCleanup);
        }
        let payload = WordPayload { value, verified };

        match self.api.mode {
            SubmitMode::Immediate => self.deliver(&payload).await,
            SubmitMode::Queued => {
                let id = self.next_job_id;
                self.next_job_id += 1;
                self.queue.push(SubmissionJob {
                    id,
                    payload,
                    passes: 0,
                });

                let (report, outcome) = self.drain_pass(Some(id)).await;
                tracing::debug!("Queue pass: {:?}, {} job(s) left", report, self.queue.len());
                outcome.unwrap_or_else(|| Err(ClientError::server("Job was not attempted")))
            }
        }
    }

    /// Runs one drain pass over the jobs currently queued.
    pub async fn flush(&mut self) -> DrainReport {
        let (report, _) = self.drain_pass(None).await;
        report
    }

    async fn drain_pass(
        &mut self,
        watch: Option<u64>,
    ) -> (DrainReport, Option<Result<SubmitReply, ClientError>>) {
        let mut report = DrainReport::default();
        let mut watched = None;

        for index in 0..self.queue.len() {
            let Some(mut job) = self.queue.pop() else {
                break;
            };
            if index > 0 {
                sleep(self.api.request_gap()).await;
            }

            let result = self.deliver(&job.payload).await;
            let is_watched = watch == Some(job.id);

            match &result {
                Ok(_) => report.delivered += 1,
                Err(err) => {
                    job.passes += 1;
                    if job.passes >= self.api.max_queue_passes {
                        tracing::error!(
                            "Dropping '{}' after {} queue passes: {}",
                            job.payload.value,
                            job.passes,
                            err
                        );
                        report.dropped += 1;
                    } else {
                        tracing::warn!(
                            "Parking '{}' at the end of the queue (pass {}/{})",
                            job.payload.value,
                            job.passes,
                            self.api.max_queue_passes
                        );
                        self.queue.push(job);
                        report.parked += 1;
                    }
                }
            }

            if is_watched {
                watched = Some(result);
            }
        }

        (report, watched)
    }

    /// Posts a payload with the retry policy.
    async fn deliver(&self, payload: &WordPayload) -> Result<SubmitReply, ClientError> {
        let result = self
            .with_retries("Submission", || async move {
                let reply = self.transport.post_word(payload).await?;
                match reply.status {
                    ReplyStatus::Success => Ok(reply),
                    ReplyStatus::Error => Err(ClientError::server(
                        reply.message.unwrap_or_else(|| "Unknown error".to_string()),
                    )),
                }
            })
            .await;

        match &result {
            Ok(_) => tracing::info!("Submitted '{}'", payload.value),
            Err(err) => tracing::error!(
                "Submission of '{}' failed after {} attempt(s): {}",
                payload.value,
                self.api.max_retries,
                err
            ),
        }
        result
    }

    /// Fetches approved words with the retry policy.
    pub async fn fetch_words(
        &self,
        limit: usize,
        random: bool,
        since: &str,
    ) -> Result<WordsReply, ClientError> {
        let query = &WordsQuery {
            limit,
            random,
            since: since.to_string(),
        };

        self.with_retries("Word fetch", || async move {
            let reply = self.transport.get_words(query).await?;
            match reply.status {
                ReplyStatus::Success => Ok(reply),
                ReplyStatus::Error => Err(ClientError::server(
                    reply.message.unwrap_or_else(|| "Unknown error".to_string()),
                )),
            }
        })
        .await
    }

    async fn with_retries<R, F, Fut>(&self, what: &str, mut attempt: F) -> Result<R, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, ClientError>>,
    {
        let max_attempts = self.api.max_retries.max(1);
        let mut number = 1;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if number < max_attempts && err.is_retryable() => {
                    let delay = self.api.retry_delay() * number;
                    tracing::warn!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        what,
                        number,
                        max_attempts,
                        err,
                        delay
                    );
                    sleep(delay).await;
                    number += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::client::transport::WordRecord;
    use crate::config::KioskConfig;
    use std::time::Duration;
    use tokio::time::Instant;

    fn api(mode: SubmitMode) -> ApiConfig {
        let mut api = KioskConfig::embedded().unwrap().into_inner().api;
        api.mode = mode;
        api
    }

    /// Test 1: Markup stripping
    #[test]
    fn test_clean_word() {
        assert_eq!(clean_word("hello"), "hello");
        assert_eq!(clean_word("<script>x</script>"), "x");
        assert_eq!(clean_word("  <i></i>  "), "");
        assert_eq!(clean_word("a<br/>b"), "ab");
        assert_eq!(clean_word("<unterminated"), "<unterminated");
        assert_eq!(clean_word(" мир "), "мир");
    }

    /// Test 2: Nothing is sent for a word that cleans to nothing
    #[tokio::test(start_paused = true)]
    async fn test_empty_after_cleanup() {
        let transport = FakeTransport::new();
        let mut client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Immediate));

        let err = client.submit("  <b> </b> ", false).await.unwrap_err();
        assert_eq!(err, ClientError::EmptyAfterCleanup);
        assert_eq!(transport.post_count(), 0);
    }

    /// Test 3: The cleaned word is what gets posted
    #[tokio::test(start_paused = true)]
    async fn test_submit_posts_clean_payload() {
        let transport = FakeTransport::new();
        let mut client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Immediate));

        client.submit(" <b>hello</b> ", true).await.unwrap();
        assert_eq!(
            transport.posted(),
            vec![WordPayload {
                value: "hello".into(),
                verified: true
            }]
        );
    }

    /// Test 4: Retries back off linearly and stop at the limit
    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff_until_exhausted() {
        let transport = FakeTransport::new();
        for _ in 0..3 {
            transport.push_submit(Err(ClientError::Transport("unreachable".into())));
        }
        let mut client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Immediate));

        let start = Instant::now();
        let err = client.submit("hello", false).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(transport.post_count(), 3);
        // 1s after the first failure, 2s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    /// Test 5: A server error reply is retried and can recover
    #[tokio::test(start_paused = true)]
    async fn test_server_error_then_success() {
        let transport = FakeTransport::new();
        transport.push_submit(Ok(SubmitReply::error("sheet locked")));
        let mut client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Immediate));

        let reply = client.submit("hello", false).await.unwrap();
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(transport.post_count(), 2);
    }

    /// Test 6: Queued mode parks a failed job and delivers it on flush
    #[tokio::test(start_paused = true)]
    async fn test_queue_parks_and_flushes() {
        let transport = FakeTransport::new();
        for _ in 0..3 {
            transport.push_submit(Ok(SubmitReply::error("busy")));
        }
        let mut client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Queued));

        let err = client.submit("first", false).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { .. }));
        assert_eq!(client.queue().len(), 1);
        assert_eq!(client.queue().iter().next().unwrap().passes, 1);

        let report = client.flush().await;
        assert_eq!(
            report,
            DrainReport {
                delivered: 1,
                parked: 0,
                dropped: 0
            }
        );
        assert!(client.queue().is_empty());
        assert_eq!(transport.post_count(), 4);
    }

    /// Test 7: Older parked jobs go first and the new job is reported
    #[tokio::test(start_paused = true)]
    async fn test_queue_is_fifo() {
        let transport = FakeTransport::new();
        for _ in 0..3 {
            transport.push_submit(Err(ClientError::Transport("down".into())));
        }
        let mut client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Queued));

        assert!(client.submit("old", false).await.is_err());
        assert!(client.submit("new", false).await.is_ok());

        let values: Vec<String> = transport.posted().into_iter().map(|p| p.value).collect();
        assert_eq!(values, ["old", "old", "old", "old", "new"]);
        assert!(client.queue().is_empty());
    }

    /// Test 8: A job is dropped after its last queue pass
    #[tokio::test(start_paused = true)]
    async fn test_queue_drops_after_max_passes() {
        let transport = FakeTransport::new();
        let mut config = api(SubmitMode::Queued);
        config.max_retries = 1;
        config.max_queue_passes = 2;
        for _ in 0..2 {
            transport.push_submit(Err(ClientError::Transport("down".into())));
        }
        let mut client = SubmissionClient::new(transport.clone(), &config);

        assert!(client.submit("doomed", false).await.is_err());
        assert_eq!(client.queue().len(), 1);

        let report = client.flush().await;
        assert_eq!(report.dropped, 1);
        assert!(client.queue().is_empty());
        assert_eq!(transport.post_count(), 2);
    }

    /// Test 9: Fetching words passes the query and retries failures
    #[tokio::test(start_paused = true)]
    async fn test_fetch_words() {
        let transport = FakeTransport::new();
        transport.push_words(Err(ClientError::Transport("timeout".into())));
        transport.push_words(Ok(WordsReply {
            status: ReplyStatus::Success,
            words: vec![WordRecord {
                value: "hello".into(),
                verified: true,
                timestamp: Some("2024-05-01T10:00:00.000Z".into()),
            }],
            total: 1,
            message: None,
        }));
        let client = SubmissionClient::new(transport.clone(), &api(SubmitMode::Immediate));

        let reply = client.fetch_words(50, false, "2024-01-01T00:00:00.000Z").await.unwrap();
        assert_eq!(reply.total, 1);

        let queries = transport.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].limit, 50);
        assert!(!queries[0].random);
        assert_eq!(queries[0].since, "2024-01-01T00:00:00.000Z");
    }
}
