use async_trait::async_trait;
use renewal_core::NotificationContext;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("delivery cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The channel has no destination configured.
    Skipped(String),
}

/// One independently invocable delivery mechanism.
///
/// Implementations report failure through the returned `Result` and never
/// panic; the dispatcher isolates each channel's outcome from the others.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable name used in logs and dispatch reports (e.g. "outlook email").
    fn name(&self) -> &str;

    async fn deliver(&self, context: &NotificationContext) -> Result<Delivery, DeliveryError>;
}
