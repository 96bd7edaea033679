//! Email-style notification delivered through an outbound webhook.

use async_trait::async_trait;
use renewal_core::{NotificationContext, Timeouts};
use serde::Serialize;
use tracing::debug;

use crate::channel::{Delivery, DeliveryError, NotificationChannel};

pub const SUBJECT: &str = "Напоминание о договоре";

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookPayload<'a> {
    pub subject: &'a str,
    pub body: &'a str,
}

pub struct WebhookChannel {
    name: String,
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookChannel {
    /// `url = None` leaves the channel in place but skipped on every delivery.
    pub fn new(
        name: impl Into<String>,
        url: Option<String>,
        timeouts: &Timeouts,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.webhook)
            .build()?;
        Ok(Self {
            name: name.into(),
            client,
            url,
        })
    }

    /// The "outlook email" channel.
    pub fn email(url: Option<String>, timeouts: &Timeouts) -> Result<Self, DeliveryError> {
        Self::new("outlook email", url, timeouts)
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, context: &NotificationContext) -> Result<Delivery, DeliveryError> {
        let Some(url) = self.url.as_deref() else {
            return Ok(Delivery::Skipped("webhook URL is not set".to_string()));
        };

        let payload = WebhookPayload {
            subject: SUBJECT,
            body: context.message(),
        };
        debug!(channel = %self.name, url = %url, "posting webhook notification");
        let resp = self.client.post(url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Delivery::Sent)
    }
}
