mod backend;
mod session;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{info, warn};

pub(crate) use backend::BackendDialogue;
pub(crate) use session::ChatSession;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ChatMessage {
    pub(crate) speaker: String,
    pub(crate) text: String,
    /// Milliseconds on screen. Derived from the text length when absent.
    #[serde(default)]
    pub(crate) duration: Option<u64>,
}

impl ChatMessage {
    pub(crate) fn new(speaker: &str, text: &str, duration: Option<u64>) -> Self {
        Self {
            speaker: speaker.to_string(),
            text: text.to_string(),
            duration,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum DialogueError {
    #[error("failed to start dialogue runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("dialogue request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("dialogue backend returned {status}")]
    Status { status: reqwest::StatusCode },
    #[error("dialogue response at {path} is malformed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("dialogue backend reported failure: {0}")]
    Rejected(String),
}

/// Anything an NPC can talk with. Every source answers asynchronously, even scripted ones.
#[async_trait]
pub(crate) trait DialogueSource: Send + Sync {
    fn npc_name(&self) -> &str;
    async fn fetch_dialogue(&self) -> Vec<ChatMessage>;
}

#[derive(Debug, Clone)]
pub(crate) struct ScriptedDialogue {
    npc_name: String,
    lines: Vec<ChatMessage>,
}

impl ScriptedDialogue {
    pub(crate) fn new(npc_name: &str, lines: Vec<ChatMessage>) -> Self {
        Self {
            npc_name: npc_name.to_string(),
            lines,
        }
    }
}

#[async_trait]
impl DialogueSource for ScriptedDialogue {
    fn npc_name(&self) -> &str {
        &self.npc_name
    }

    async fn fetch_dialogue(&self) -> Vec<ChatMessage> {
        self.lines.clone()
    }
}

/// Runs dialogue fetches off the tick thread. Cloning shares the same runtime.
#[derive(Clone)]
pub(crate) struct DialogueDispatcher {
    runtime: Arc<Runtime>,
}

impl DialogueDispatcher {
    pub(crate) fn new() -> Result<Self, DialogueError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("dialogue")
            .enable_all()
            .build()
            .map_err(DialogueError::Runtime)?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    pub(crate) fn request(&self, source: Arc<dyn DialogueSource>) -> DialogueTicket {
        let (sender, receiver) = oneshot::channel();
        let npc_name = source.npc_name().to_string();
        info!(npc = npc_name.as_str(), "dialogue_requested");
        self.runtime.spawn(async move {
            let messages = source.fetch_dialogue().await;
            // The ticket is gone when the scene moved on.
            let _ = sender.send(messages);
        });
        DialogueTicket { npc_name, receiver }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TicketPoll {
    Pending,
    Ready(Vec<ChatMessage>),
    Lost,
}

/// Pending answer for one NPC. Dropping it abandons the request.
#[derive(Debug)]
pub(crate) struct DialogueTicket {
    npc_name: String,
    receiver: oneshot::Receiver<Vec<ChatMessage>>,
}

impl DialogueTicket {
    pub(crate) fn npc_name(&self) -> &str {
        &self.npc_name
    }

    pub(crate) fn poll(&mut self) -> TicketPoll {
        match self.receiver.try_recv() {
            Ok(messages) => TicketPoll::Ready(messages),
            Err(TryRecvError::Empty) => TicketPoll::Pending,
            Err(TryRecvError::Closed) => {
                warn!(npc = self.npc_name.as_str(), "dialogue_request_lost");
                TicketPoll::Lost
            }
        }
    }
}
