//! Reminder text for one contract alert.
//!
//! The chat-completions path is attempted only when the text service is
//! fully configured. Any failure on that path (transport error, timeout,
//! non-2xx status, cancellation) falls back to [`fallback_message`], which
//! depends on nothing but the alert and its day count.

use std::sync::Arc;

use renewal_core::{ContractAlert, EventKind, EventSink, RunEvent, Settings};
use tokio_util::sync::CancellationToken;

use crate::client::{ChatClient, ChatMessage, ChatRequest, GenerateError};

// ── Prompt templates ──

const SYSTEM_PROMPT: &str =
    "Ты помощник, который пишет короткие и понятные уведомления о договорах.";

/// Returned when the service answers but the reply carries no text.
pub const UNREADABLE_ANSWER: &str = "Не удалось получить ответ от модели.";

const TEMPERATURE: f64 = 0.4;
const MAX_TOKENS: u32 = 200;

pub fn user_prompt(alert: &ContractAlert, days_remaining: i64) -> String {
    format!(
        "Сформируй напоминание: до окончания договора {number} с {customer} осталось {days} дней. \
         Продление {renewal}. Сделай текст дружелюбным и конкретным.",
        number = alert.contract_number(),
        customer = alert.customer_name(),
        days = days_remaining,
        renewal = if alert.auto_renewal() {
            "предусмотрено"
        } else {
            "не предусмотрено"
        },
    )
}

/// The deterministic reminder used whenever the model path is skipped or fails.
pub fn fallback_message(alert: &ContractAlert, days_remaining: i64) -> String {
    let advice = if alert.auto_renewal() {
        "Продление предусмотрено — проверьте детали."
    } else {
        "Продление не предусмотрено — стоит связаться с клиентом."
    };
    format!(
        "Через {days_remaining} дней заканчивается договор №{} с {}. {advice}",
        alert.contract_number(),
        alert.customer_name(),
    )
}

pub fn chat_request(alert: &ContractAlert, days_remaining: i64) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_prompt(alert, days_remaining)),
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

// ── Types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Endpoint, credential or deployment missing.
    Unconfigured,
    /// The call was attempted and did not produce a 2xx JSON answer.
    ServiceFailed,
}

/// Where a message's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Model,
    /// The service answered, but without usable text; the text is [`UNREADABLE_ANSWER`].
    ModelUnreadable,
    Fallback(FallbackReason),
}

/// A reminder whose `text` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    pub text: String,
    pub source: MessageSource,
}

impl GeneratedMessage {
    pub fn is_from_model(&self) -> bool {
        self.source == MessageSource::Model
    }
}

// ── Generator ──

pub struct MessageGenerator {
    client: Option<ChatClient>,
    sink: Arc<dyn EventSink>,
}

impl MessageGenerator {
    /// With `client = None` every message is the fallback.
    pub fn new(client: Option<ChatClient>, sink: Arc<dyn EventSink>) -> Self {
        Self { client, sink }
    }

    pub fn from_settings(settings: &Settings, sink: Arc<dyn EventSink>) -> Result<Self, GenerateError> {
        let client = settings
            .text_service()
            .map(|config| ChatClient::new(config, &settings.timeouts))
            .transpose()?;
        Ok(Self::new(client, sink))
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub async fn build_human_message(
        &self,
        alert: &ContractAlert,
        cancel: &CancellationToken,
    ) -> GeneratedMessage {
        self.build_with_days(alert, alert.days_remaining(), cancel).await
    }

    /// As [`build_human_message`](Self::build_human_message) with the day count fixed by the caller.
    pub async fn build_with_days(
        &self,
        alert: &ContractAlert,
        days_remaining: i64,
        cancel: &CancellationToken,
    ) -> GeneratedMessage {
        let number = alert.contract_number();

        let Some(client) = &self.client else {
            self.sink.record(
                RunEvent::info(
                    EventKind::TextServiceUnconfigured,
                    format!("contract {number}: text service not configured; using fallback message"),
                )
                .with_contract(number),
            );
            return self.fallback(alert, days_remaining, FallbackReason::Unconfigured);
        };

        let request = chat_request(alert, days_remaining);
        let message = match client.complete(&request, cancel).await {
            Ok(Some(text)) if !text.trim().is_empty() => GeneratedMessage {
                text: text.trim().to_string(),
                source: MessageSource::Model,
            },
            Ok(_) => {
                self.sink.record(
                    RunEvent::warn(
                        EventKind::ModelAnswerUnreadable,
                        format!("contract {number}: model answer had no text"),
                    )
                    .with_contract(number),
                );
                GeneratedMessage {
                    text: UNREADABLE_ANSWER.to_string(),
                    source: MessageSource::ModelUnreadable,
                }
            }
            Err(e) => {
                let mut event = RunEvent::warn(
                    EventKind::TextServiceFailed,
                    format!("contract {number}: text service call failed: {e}"),
                )
                .with_contract(number);
                if let GenerateError::Server { status, .. } = &e {
                    event = event.with_status(*status);
                }
                self.sink.record(event);
                return self.fallback(alert, days_remaining, FallbackReason::ServiceFailed);
            }
        };

        let detail = match message.source {
            MessageSource::ModelUnreadable => "unreadable model answer; using placeholder text",
            _ => "message from model",
        };
        self.sink.record(
            RunEvent::info(EventKind::MessageGenerated, format!("contract {number}: {detail}"))
                .with_contract(number),
        );
        message
    }

    fn fallback(
        &self,
        alert: &ContractAlert,
        days_remaining: i64,
        reason: FallbackReason,
    ) -> GeneratedMessage {
        let number = alert.contract_number();
        self.sink.record(
            RunEvent::info(
                EventKind::MessageGenerated,
                format!("contract {number}: fallback message"),
            )
            .with_contract(number),
        );
        GeneratedMessage {
            text: fallback_message(alert, days_remaining),
            source: MessageSource::Fallback(reason),
        }
    }
}
