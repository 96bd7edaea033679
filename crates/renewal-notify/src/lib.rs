//! Notification delivery: channel capability trait, webhook channel, dispatcher.

mod channel;
mod dispatcher;
mod webhook;

pub use channel::{Delivery, DeliveryError, NotificationChannel};
pub use dispatcher::{ChannelOutcome, ChannelStatus, DispatchReport, Dispatcher};
pub use webhook::{SUBJECT, WebhookChannel, WebhookPayload};
