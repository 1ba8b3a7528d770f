//! Instagram channel: replies through the Graph API Send API (`/me/messages`).

use crate::channels::reply::{DeliveryOutcome, ReplySender, SendError};
use crate::config::InstagramConfig;
use async_trait::async_trait;
use serde::Serialize;

/// Outbound Send API body: `{ recipient: { id }, message: { text } }`.
#[derive(Debug, Serialize)]
pub struct OutboundReply<'a> {
    pub recipient: Recipient<'a>,
    pub message: OutboundMessage<'a>,
}

#[derive(Debug, Serialize)]
pub struct Recipient<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    pub text: &'a str,
}

impl<'a> OutboundReply<'a> {
    pub fn text(recipient_id: &'a str, text: &'a str) -> Self {
        Self {
            recipient: Recipient { id: recipient_id },
            message: OutboundMessage { text },
        }
    }
}

/// Instagram channel connector: sends text replies with the page access token.
pub struct InstagramChannel {
    id: String,
    messages_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl InstagramChannel {
    pub fn new(config: &InstagramConfig) -> Self {
        let messages_url = format!(
            "{}/{}/me/messages",
            config.graph_api_base.trim_end_matches('/'),
            config.graph_api_version
        );
        Self {
            id: "instagram".to_string(),
            messages_url,
            access_token: config.page_access_token.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send API endpoint without the credential.
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// POST a text reply. Without an access token nothing is sent. A non-success status is
    /// reported as `Rejected`; only transport failures are errors. No retry.
    pub async fn send_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<DeliveryOutcome, SendError> {
        let Some(token) = self.access_token.as_deref() else {
            log::warn!("PAGE_ACCESS_TOKEN missing; cannot reply to {}", recipient_id);
            return Ok(DeliveryOutcome::Skipped);
        };
        let res = self
            .client
            .post(&self.messages_url)
            .query(&[("access_token", token)])
            .json(&OutboundReply::text(recipient_id, text))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            log::error!("{} send failed: {} {}", self.id, status, body);
            return Ok(DeliveryOutcome::Rejected { status, body });
        }
        log::info!("{}: replied to {}", self.id, recipient_id);
        Ok(DeliveryOutcome::Sent)
    }
}

#[async_trait]
impl ReplySender for InstagramChannel {
    async fn send_reply(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<DeliveryOutcome, SendError> {
        InstagramChannel::send_message(self, recipient_id, text).await
    }
}
