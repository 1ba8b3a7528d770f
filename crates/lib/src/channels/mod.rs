//! Messaging channel: inbound webhook payload model and the outbound reply sender.
//!
//! The dispatcher only sees the `ReplySender` trait so tests can swap in a recorder.

mod inbound;
mod instagram;
mod reply;

pub use inbound::{
    EventAction, MessagingEvent, PayloadError, ReplyTarget, SkipReason, WebhookEntry,
    WebhookPayload, FALLBACK_REPLY_TEXT, INSTAGRAM_OBJECT,
};
pub use instagram::{InstagramChannel, OutboundReply};
pub use reply::{DeliveryOutcome, ReplySender, SendError};
