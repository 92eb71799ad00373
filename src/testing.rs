//! In-process QA backends for tests

use crate::error::RemoteError;
use crate::events::EventSource;
use crate::qa::{ChatReply, ChatRequest, QaBackend};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub fn reply(answer: &str, sources: Vec<EventSource>) -> ChatReply {
    ChatReply {
        answer: answer.to_string(),
        sources,
    }
}

/// Answers every request the same way and remembers what it was asked.
pub struct ScriptedBackend {
    reply: Option<ChatReply>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn answering(reply: ChatReply) -> Self {
        Self {
            reply: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every request the way a dead server would.
    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl QaBackend for ScriptedBackend {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().ok_or(RemoteError::Status(503))
    }
}

/// Holds its single answer until the test releases it through the sender.
pub struct GatedBackend {
    gate: Mutex<Option<oneshot::Receiver<Result<ChatReply, RemoteError>>>>,
}

impl GatedBackend {
    pub fn new() -> (Self, oneshot::Sender<Result<ChatReply, RemoteError>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                gate: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait::async_trait]
impl QaBackend for GatedBackend {
    async fn ask(&self, _request: &ChatRequest) -> Result<ChatReply, RemoteError> {
        let gate = self.gate.lock().unwrap().take();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RemoteError::Malformed("gate dropped".to_string()))),
            None => Err(RemoteError::Malformed("gate already used".to_string())),
        }
    }
}
