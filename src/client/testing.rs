// SPDX-License-Identifier: GPL-3.0-only

//! Scripted in-memory transport for tests.

use crate::client::error::ClientError;
use crate::client::transport::{SubmitReply, WordPayload, WordTransport, WordsQuery, WordsReply};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

type Hook = Rc<dyn Fn(&WordPayload)>;

#[derive(Default)]
struct FakeState {
    submit_replies: VecDeque<Result<SubmitReply, ClientError>>,
    words_replies: VecDeque<Result<WordsReply, ClientError>>,
    posted: Vec<WordPayload>,
    queries: Vec<WordsQuery>,
    latency: Duration,
    hook: Option<Hook>,
}

/// Transport that replays queued replies and records every request.
///
/// Clones share state, so a test keeps one handle while the client owns
/// another. With no scripted reply left, posts succeed and fetches return an
/// empty collection.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    state: Rc<RefCell<FakeState>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_submit(&self, reply: Result<SubmitReply, ClientError>) {
        self.state.borrow_mut().submit_replies.push_back(reply);
    }

    pub(crate) fn push_words(&self, reply: Result<WordsReply, ClientError>) {
        self.state.borrow_mut().words_replies.push_back(reply);
    }

    /// Delays every reply by `latency`.
    pub(crate) fn set_latency(&self, latency: Duration) {
        self.state.borrow_mut().latency = latency;
    }

    /// Runs `hook` at the start of every post.
    pub(crate) fn set_hook(&self, hook: impl Fn(&WordPayload) + 'static) {
        self.state.borrow_mut().hook = Some(Rc::new(hook));
    }

    pub(crate) fn posted(&self) -> Vec<WordPayload> {
        self.state.borrow().posted.clone()
    }

    pub(crate) fn post_count(&self) -> usize {
        self.state.borrow().posted.len()
    }

    pub(crate) fn queries(&self) -> Vec<WordsQuery> {
        self.state.borrow().queries.clone()
    }

    async fn wait(&self) {
        let latency = self.state.borrow().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl WordTransport for FakeTransport {
    async fn post_word(&self, payload: &WordPayload) -> Result<SubmitReply, ClientError> {
        let hook = {
            let mut state = self.state.borrow_mut();
            state.posted.push(payload.clone());
            state.hook.clone()
        };
        if let Some(hook) = hook {
            hook(payload);
        }

        self.wait().await;
        self.state
            .borrow_mut()
            .submit_replies
            .pop_front()
            .unwrap_or_else(|| Ok(SubmitReply::success()))
    }

    async fn get_words(&self, query: &WordsQuery) -> Result<WordsReply, ClientError> {
        self.state.borrow_mut().queries.push(query.clone());

        self.wait().await;
        self.state
            .borrow_mut()
            .words_replies
            .pop_front()
            .unwrap_or_else(|| {
                Ok(WordsReply {
                    status: crate::client::transport::ReplyStatus::Success,
                    words: Vec::new(),
                    total: 0,
                    message: None,
                })
            })
    }
}
