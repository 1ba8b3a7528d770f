//! Event dispatcher: check `object`, then walk entries and messaging events, filter, and
//! reply one by one.
//!
//! Replies are awaited in order. A rejected reply is logged and dispatch moves on; a
//! transport failure or an unreadable event aborts the request. Replies already sent stay sent.

use crate::channels::{DeliveryOutcome, EventAction, ReplySender, WebhookPayload};
use crate::gateway::WebhookError;
use std::sync::Arc;

/// Per-request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub rejected: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct Dispatcher {
    own_id: Option<String>,
    sender: Arc<dyn ReplySender>,
}

impl Dispatcher {
    /// `own_id` is the relay's Instagram account id (IG_USER_ID); its own events are ignored.
    pub fn new(own_id: Option<String>, sender: Arc<dyn ReplySender>) -> Self {
        Self { own_id, sender }
    }

    pub async fn dispatch(&self, payload: &WebhookPayload) -> Result<DispatchSummary, WebhookError> {
        if !payload.is_instagram() {
            return Err(WebhookError::ShapeMismatch(payload.object()));
        }
        let unexpected = |e: &dyn std::fmt::Display| WebhookError::Unexpected(e.to_string());
        let mut summary = DispatchSummary::default();
        for entry in payload.entries().map_err(|e| unexpected(&e))? {
            for event in entry.messaging().map_err(|e| unexpected(&e))? {
                let target = match event
                    .action(self.own_id.as_deref())
                    .map_err(|e| unexpected(&e))?
                {
                    EventAction::Reply(t) => t,
                    EventAction::Skip(reason) => {
                        log::debug!("skipping messaging event: {:?}", reason);
                        summary.skipped += 1;
                        continue;
                    }
                };
                let outcome = self
                    .sender
                    .send_reply(&target.recipient_id, &target.text)
                    .await
                    .map_err(|e| unexpected(&e))?;
                match outcome {
                    DeliveryOutcome::Sent => summary.sent += 1,
                    DeliveryOutcome::Rejected { .. } => summary.rejected += 1,
                    DeliveryOutcome::Skipped => summary.skipped += 1,
                }
            }
        }
        Ok(summary)
    }
}
