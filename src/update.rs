//! Normalized updates and the two collaborators the poller drives.

use async_trait::async_trait;

use crate::error::{HandlerError, SourceError};

/// Ordered group of updates returned by a single fetch.
pub type UpdateBatch = Vec<Update>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub id: u32,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Message(UpdateMessage),
    /// Anything the bot does not act on, named by its platform type.
    Other { kind: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessage {
    pub id: i32,
    pub user_id: u64,
    pub chat_id: i64,
    pub text: String,
}

impl Update {
    pub fn message(id: u32, message: UpdateMessage) -> Self {
        Self {
            id,
            kind: UpdateKind::Message(message),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            UpdateKind::Message(_) => "message",
            UpdateKind::Other { kind } => kind,
        }
    }
}

/// Yields batches of updates since the last acknowledged position.
///
/// Implementations are expected to return within a bounded time (a long-poll
/// timeout) and to track their own offset, so that a batch is never delivered
/// twice.
#[async_trait]
pub trait UpdateSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<UpdateBatch, SourceError>;
}

/// Consumes a batch of updates, in order.
#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    async fn handle(&self, batch: UpdateBatch) -> Result<(), HandlerError>;
}
