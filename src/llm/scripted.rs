//! Scripted generator for tests and dry runs

use super::{GenerationError, TextGenerator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

type Responder = Box<dyn Fn(&str, &str) -> Result<String, GenerationError> + Send + Sync>;

/// A prompt the generator received, with its system instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub system_instruction: String,
}

/// Replays queued replies (or failures) in order and records every call.
///
/// Once the queue is drained, calls go to the responder if one is set;
/// otherwise they fail with `Unavailable`.
pub struct ScriptedGenerator {
    name: String,
    queue: Mutex<VecDeque<Result<String, GenerationError>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            name: "scripted".to_string(),
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Generator name recorded on edges.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a reply.
    pub fn with_response(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queue a failure.
    pub fn with_failure(self, error: GenerationError) -> Self {
        self.push(Err(error));
        self
    }

    /// Answer calls that arrive after the queue is drained.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Queue a reply on a shared generator.
    pub fn push(&self, reply: Result<String, GenerationError>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Replies still queued.
    pub fn remaining(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                prompt: prompt.to_string(),
                system_instruction: system_instruction.to_string(),
            });

        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match (queued, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(prompt, system_instruction),
            (None, None) => Err(GenerationError::Unavailable(
                "scripted generator has no replies left".to_string(),
            )),
        }
    }
}
