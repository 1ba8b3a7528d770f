//! Reply sender seam: the dispatcher talks to this trait, not to a concrete channel.

use async_trait::async_trait;

/// Result of one best-effort reply. Callers may ignore it; failures are already logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// The platform answered with a non-success status.
    Rejected { status: u16, body: String },
    /// No access token configured; nothing was sent.
    Skipped,
}

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("reply request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// For senders that do not go through reqwest (and test doubles).
    #[error("reply transport error: {0}")]
    Transport(String),
}

/// Sends a text reply to a platform user.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<DeliveryOutcome, SendError>;
}
