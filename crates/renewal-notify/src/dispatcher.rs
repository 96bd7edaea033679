//! Sequential fan-out of one notification to every configured channel.

use std::sync::Arc;

use renewal_core::{EventKind, EventSink, NotificationContext, RunEvent, Settings};
use tokio_util::sync::CancellationToken;

use crate::channel::{Delivery, DeliveryError, NotificationChannel};
use crate::webhook::WebhookChannel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Delivered,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: String,
    pub status: ChannelStatus,
}

/// One outcome per channel, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Delivered))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ChannelStatus::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&ChannelStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

pub struct Dispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>, sink: Arc<dyn EventSink>) -> Self {
        Self { channels, sink }
    }

    /// The standard channel set: currently the email webhook.
    pub fn from_settings(
        settings: &Settings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, DeliveryError> {
        let email: Box<dyn NotificationChannel> = Box::new(WebhookChannel::email(
            settings.webhook_url().map(str::to_string),
            &settings.timeouts,
        )?);
        Ok(Self::new(vec![email], sink))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Attempt every channel once, in order.
    ///
    /// A channel's failure is reported and recorded in the returned report;
    /// it never stops the remaining channels from being attempted.
    pub async fn send_all(
        &self,
        context: &NotificationContext,
        cancel: &CancellationToken,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        for channel in &self.channels {
            let status = self.send_one(channel.as_ref(), context, cancel).await;
            report.outcomes.push(ChannelOutcome {
                channel: channel.name().to_string(),
                status,
            });
        }
        report
    }

    async fn send_one(
        &self,
        channel: &dyn NotificationChannel,
        context: &NotificationContext,
        cancel: &CancellationToken,
    ) -> ChannelStatus {
        let name = channel.name();
        let number = context.contract_alert().contract_number();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeliveryError::Cancelled),
            result = channel.deliver(context) => result,
        };

        match result {
            Ok(Delivery::Sent) => {
                self.sink.record(
                    RunEvent::info(
                        EventKind::ChannelDelivered,
                        format!("contract {number}: {name} notification sent"),
                    )
                    .with_contract(number)
                    .with_channel(name),
                );
                ChannelStatus::Delivered
            }
            Ok(Delivery::Skipped(reason)) => {
                self.sink.record(
                    RunEvent::info(
                        EventKind::ChannelSkipped,
                        format!("contract {number}: {reason}; skipping {name}"),
                    )
                    .with_contract(number)
                    .with_channel(name),
                );
                ChannelStatus::Skipped(reason)
            }
            Err(e) => {
                let mut event = RunEvent::warn(
                    EventKind::ChannelFailed,
                    format!("contract {number}: failed to send {name} notification: {e}"),
                )
                .with_contract(number)
                .with_channel(name);
                if let DeliveryError::Server { status, .. } = &e {
                    event = event.with_status(*status);
                }
                self.sink.record(event);
                ChannelStatus::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use renewal_core::{ContractAlert, MemorySink, Severity, Timeouts};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records how often it was invoked.
    struct CountingChannel {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationChannel for CountingChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn deliver(&self, _context: &NotificationContext) -> Result<Delivery, DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DeliveryError::Server {
                    status: 503,
                    body: "unavailable".into(),
                })
            } else {
                Ok(Delivery::Sent)
            }
        }
    }

    fn counting(name: &'static str, fail: bool) -> (Box<dyn NotificationChannel>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel = CountingChannel {
            name,
            calls: calls.clone(),
            fail,
        };
        (Box::new(channel), calls)
    }

    fn context() -> NotificationContext {
        let alert = ContractAlert::new(
            "C-1",
            "Acme",
            NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
            true,
        );
        NotificationContext::new(Arc::new(alert), "Через 5 дней заканчивается договор №C-1")
    }

    #[tokio::test]
    async fn webhook_500_does_not_stop_next_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let webhook: Box<dyn NotificationChannel> = Box::new(
            WebhookChannel::email(Some(server.uri()), &Timeouts::default()).unwrap(),
        );
        let (second, calls) = counting("sms", false);
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(vec![webhook, second], sink.clone());

        let report = dispatcher.send_all(&context(), &CancellationToken::new()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].channel, "outlook email");
        assert!(matches!(report.outcomes[0].status, ChannelStatus::Failed(_)));
        assert_eq!(report.outcomes[1].status, ChannelStatus::Delivered);

        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, EventKind::ChannelFailed);
        assert!(warnings[0].detail.contains("outlook email"));
        assert_eq!(warnings[0].contract.as_deref(), Some("C-1"));
        assert_eq!(warnings[0].channel.as_deref(), Some("outlook email"));
        assert_eq!(warnings[0].status, Some(500));
    }

    #[tokio::test]
    async fn events_carry_contract_and_channel() {
        let (first, _) = counting("first", false);
        let (second, _) = counting("second", true);
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(vec![first, second], sink.clone());

        dispatcher.send_all(&context(), &CancellationToken::new()).await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::ChannelDelivered);
        assert_eq!(events[0].contract.as_deref(), Some("C-1"));
        assert_eq!(events[0].channel.as_deref(), Some("first"));
        assert_eq!(events[0].status, None);
        assert_eq!(events[1].kind, EventKind::ChannelFailed);
        assert_eq!(events[1].channel.as_deref(), Some("second"));
        assert_eq!(events[1].status, Some(503));
    }

    #[tokio::test]
    async fn every_channel_attempted_in_order() {
        let (first, first_calls) = counting("first", true);
        let (second, second_calls) = counting("second", true);
        let (third, third_calls) = counting("third", false);
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(vec![first, second, third], sink.clone());

        let report = dispatcher.send_all(&context(), &CancellationToken::new()).await;

        for calls in [first_calls, second_calls, third_calls] {
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
        let names: Vec<_> = report.outcomes.iter().map(|o| o.channel.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.delivered(), 1);
    }

    #[tokio::test]
    async fn unconfigured_webhook_is_skipped_at_info() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::from_settings(&Settings::default(), sink.clone()).unwrap();
        assert_eq!(dispatcher.channel_names(), ["outlook email"]);

        let report = dispatcher.send_all(&context(), &CancellationToken::new()).await;

        assert_eq!(report.skipped(), 1);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ChannelSkipped);
        assert_eq!(events[0].severity, Severity::Info);
        assert_eq!(events[0].channel.as_deref(), Some("outlook email"));
    }

    #[tokio::test]
    async fn cancelled_token_fails_channels_without_calling_them() {
        let (first, first_calls) = counting("first", false);
        let (second, second_calls) = counting("second", false);
        let sink = Arc::new(MemorySink::new());
        let dispatcher = Dispatcher::new(vec![first, second], sink.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = dispatcher.send_all(&context(), &cancel).await;

        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.failed(), 2);
        assert_eq!(sink.count(EventKind::ChannelFailed), 2);
    }

    #[tokio::test]
    async fn no_channels_is_an_empty_report() {
        let dispatcher = Dispatcher::new(Vec::new(), Arc::new(MemorySink::new()));
        let report = dispatcher.send_all(&context(), &CancellationToken::new()).await;
        assert!(report.outcomes.is_empty());
    }
}
