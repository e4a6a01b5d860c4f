//! Hand-written LLM doubles for use-case and API tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

pub const DEFAULT_REPLY: &str = "The tide turns quietly.";

/// Answers from a queue of scripted replies, then with [`DEFAULT_REPLY`].
/// Records every prompt it receives.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let llm = Self::default();
        llm.replies
            .lock()
            .unwrap()
            .extend(replies.into_iter().map(|r| Ok(r.into())));
        Arc::new(llm)
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt_text());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply.map(LlmResponse::text),
            None => Ok(LlmResponse::text(DEFAULT_REPLY)),
        }
    }
}

/// Blocks every call until [`GatedLlm::open`] and counts calls.
#[derive(Default)]
pub struct GatedLlm {
    gate: Notify,
    started: Notify,
    calls: AtomicUsize,
}

impl GatedLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Resolves once a call is waiting at the gate.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn open(&self) {
        self.gate.notify_waiters();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmPort for GatedLlm {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let opened = self.gate.notified();
        self.started.notify_one();
        opened.await;
        Ok(LlmResponse::text(DEFAULT_REPLY))
    }
}
