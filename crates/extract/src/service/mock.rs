//! Scripted content service for testing.

use super::error::{ErrorKind, Result};
use super::{ContentService, Request};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

type Answer = std::result::Result<String, ErrorKind>;

/// Content service answering from a script.
///
/// Scripted answers are handed out in order, one per call; once the script
/// runs dry every further call gets the fallback answer. Every call is
/// counted, including those that fail.
pub struct MockService {
    script: Mutex<VecDeque<Answer>>,
    fallback: Answer,
    credential: bool,
    calls: AtomicUsize,
}
impl MockService {
    /// Always answer with `text`.
    pub fn answering(text: impl Into<String>) -> Self {
        Self::with_fallback(Ok(text.into()))
    }

    /// Always fail with `kind`.
    pub fn failing(kind: ErrorKind) -> Self {
        Self::with_fallback(Err(kind))
    }

    fn with_fallback(fallback: Answer) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            credential: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue answers to hand out before falling back.
    pub fn then_script(self, answers: impl IntoIterator<Item = Answer>) -> Self {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).extend(answers);
        self
    }

    /// Report no credential from [`has_credential`](ContentService::has_credential).
    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn generate(&self, _request: Request<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        Ok(answer.unwrap_or_else(|| self.fallback.clone())?)
    }
}
