//! Chat transports the bot reads messages from and replies through.

mod console;

pub use console::ConsoleTransport;

use async_trait::async_trait;

/// A message received from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Who sent it; replies go back to this sender
    pub sender: String,
    pub content: String,
}

impl IncomingMessage {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of chat messages and sink for replies.
#[async_trait]
pub trait Transport: Send {
    /// Next incoming message, or `None` once the transport is closed
    async fn next_message(&mut self) -> Result<Option<IncomingMessage>, TransportError>;

    async fn send_reply(&mut self, to: &IncomingMessage, text: &str) -> Result<(), TransportError>;
}
