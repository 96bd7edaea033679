//! Run events: the structured record of what a run did and what it skipped.
//!
//! Components never log directly. Each receives an [`EventSink`] at
//! construction and reports through it, so tests can inspect exactly which
//! warnings a run produced.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PayloadMissing,
    PayloadRejected,
    AlertsLoaded,
    NoAlerts,
    TextServiceUnconfigured,
    TextServiceFailed,
    ModelAnswerUnreadable,
    MessageGenerated,
    ChannelSkipped,
    ChannelDelivered,
    ChannelFailed,
    RunCancelled,
    RunCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PayloadMissing => "payload-missing",
            EventKind::PayloadRejected => "payload-rejected",
            EventKind::AlertsLoaded => "alerts-loaded",
            EventKind::NoAlerts => "no-alerts",
            EventKind::TextServiceUnconfigured => "text-service-unconfigured",
            EventKind::TextServiceFailed => "text-service-failed",
            EventKind::ModelAnswerUnreadable => "model-answer-unreadable",
            EventKind::MessageGenerated => "message-generated",
            EventKind::ChannelSkipped => "channel-skipped",
            EventKind::ChannelDelivered => "channel-delivered",
            EventKind::ChannelFailed => "channel-failed",
            EventKind::RunCancelled => "run-cancelled",
            EventKind::RunCompleted => "run-completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported event with the timestamp added at creation.
///
/// `contract`, `channel` and `status` are set when the event concerns one
/// contract, one delivery channel or one HTTP response.
#[derive(Debug, Clone)]
pub struct RunEvent {
    pub kind: EventKind,
    pub severity: Severity,
    pub detail: String,
    pub contract: Option<String>,
    pub channel: Option<String>,
    pub status: Option<u16>,
    pub at: DateTime<Utc>,
}

impl RunEvent {
    pub fn info(kind: EventKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Severity::Info, detail)
    }

    pub fn warn(kind: EventKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warn, detail)
    }

    fn new(kind: EventKind, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            detail: detail.into(),
            contract: None,
            channel: None,
            status: None,
            at: Utc::now(),
        }
    }

    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: RunEvent);
}

/// Forwards events to `tracing`; absent fields are left out of the record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: RunEvent) {
        let contract = event.contract.as_deref();
        let channel = event.channel.as_deref();
        match event.severity {
            Severity::Info => tracing::info!(
                event = %event.kind,
                contract,
                channel,
                status = event.status,
                "{}",
                event.detail
            ),
            Severity::Warn => tracing::warn!(
                event = %event.kind,
                contract,
                channel,
                status = event.status,
                "{}",
                event.detail
            ),
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RunEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }

    pub fn warnings(&self) -> Vec<RunEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.severity == Severity::Warn)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: RunEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
