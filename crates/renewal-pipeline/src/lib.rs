//! The daily renewal run: load alerts once, then generate and dispatch a
//! reminder for each alert in turn.

use std::sync::Arc;

use anyhow::Context;
use renewal_ai::{GeneratedMessage, MessageGenerator, MessageSource};
use renewal_core::{
    AlertLoader, ContractAlert, EventKind, EventSink, NotificationContext, RunEvent, Settings,
};
use renewal_notify::Dispatcher;
use tokio_util::sync::CancellationToken;

/// Counts for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub alerts: usize,
    pub processed: usize,
    pub generated_by_model: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct Pipeline {
    loader: AlertLoader,
    generator: MessageGenerator,
    dispatcher: Dispatcher,
    sink: Arc<dyn EventSink>,
}

impl Pipeline {
    pub fn new(
        loader: AlertLoader,
        generator: MessageGenerator,
        dispatcher: Dispatcher,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            loader,
            generator,
            dispatcher,
            sink,
        }
    }

    /// Wire every component from `settings`, all reporting to `sink`.
    pub fn from_settings(settings: &Settings, sink: Arc<dyn EventSink>) -> anyhow::Result<Self> {
        let loader = AlertLoader::new(
            settings.alerts_payload().map(str::to_string),
            sink.clone(),
        );
        let generator = MessageGenerator::from_settings(settings, sink.clone())
            .context("building text service client")?;
        let dispatcher =
            Dispatcher::from_settings(settings, sink.clone()).context("building channels")?;
        Ok(Self::new(loader, generator, dispatcher, sink))
    }

    /// Process every alert, strictly in order. Never fails.
    ///
    /// Cancellation is checked between alerts; an alert already in flight
    /// finishes through its fallback/failure paths.
    pub async fn run(&self, cancel: &CancellationToken) -> RunSummary {
        let alerts = self.loader.load_expiring_contracts();
        let mut summary = RunSummary {
            alerts: alerts.len(),
            ..RunSummary::default()
        };
        if alerts.is_empty() {
            self.sink.record(RunEvent::info(
                EventKind::NoAlerts,
                "no contract alerts to process",
            ));
            return summary;
        }

        for alert in alerts {
            if cancel.is_cancelled() {
                self.sink.record(RunEvent::warn(
                    EventKind::RunCancelled,
                    format!(
                        "run cancelled after {} of {} alerts",
                        summary.processed, summary.alerts
                    ),
                ));
                return summary;
            }

            let alert = Arc::new(alert);
            let message = self.generator.build_human_message(&alert, cancel).await;
            if message.source == MessageSource::Model {
                summary.generated_by_model += 1;
            }

            let context = NotificationContext::new(alert, message.text);
            let report = self.dispatcher.send_all(&context, cancel).await;
            summary.delivered += report.delivered();
            summary.failed += report.failed();
            summary.processed += 1;
        }

        self.sink.record(RunEvent::info(
            EventKind::RunCompleted,
            format!(
                "processed {} alerts: {} notifications delivered, {} failed",
                summary.processed, summary.delivered, summary.failed
            ),
        ));
        summary
    }

    /// Generate every reminder without dispatching any of them.
    pub async fn preview(&self, cancel: &CancellationToken) -> Vec<(ContractAlert, GeneratedMessage)> {
        let mut previews = Vec::new();
        for alert in self.loader.load_expiring_contracts() {
            if cancel.is_cancelled() {
                break;
            }
            let message = self.generator.build_human_message(&alert, cancel).await;
            previews.push((alert, message));
        }
        previews
    }
}
