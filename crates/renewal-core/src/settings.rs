//! Run configuration, injected at construction time.

use std::fmt;
use std::time::Duration;

/// Every option a run recognises. Blank values count as absent.
#[derive(Clone, Default)]
pub struct Settings {
    pub alerts_payload: Option<String>,
    pub text_service_endpoint: Option<String>,
    pub text_service_credential: Option<String>,
    pub text_service_deployment: Option<String>,
    pub webhook_url: Option<String>,
    pub timeouts: Timeouts,
}

/// Bounds on each outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect bound shared by every client.
    pub connect: Duration,
    /// Total bound on one chat-completions call.
    pub text_service: Duration,
    /// Total bound on one webhook POST.
    pub webhook: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            text_service: Duration::from_secs(20),
            webhook: Duration::from_secs(10),
        }
    }
}

/// The three values gating the generative-text path.
#[derive(Clone, PartialEq, Eq)]
pub struct TextServiceConfig {
    pub endpoint: String,
    pub credential: String,
    pub deployment: String,
}

impl fmt::Debug for TextServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("deployment", &self.deployment)
            .finish()
    }
}

impl Settings {
    /// The alert payload, if one was supplied and is not blank.
    pub fn alerts_payload(&self) -> Option<&str> {
        non_blank(&self.alerts_payload)
    }

    pub fn webhook_url(&self) -> Option<&str> {
        non_blank(&self.webhook_url)
    }

    /// `Some` only when endpoint, credential and deployment are all present.
    pub fn text_service(&self) -> Option<TextServiceConfig> {
        Some(TextServiceConfig {
            endpoint: non_blank(&self.text_service_endpoint)?.to_string(),
            credential: non_blank(&self.text_service_credential)?.to_string(),
            deployment: non_blank(&self.text_service_deployment)?.to_string(),
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field(
                "alerts_payload",
                &self.alerts_payload.as_ref().map(|p| format!("<{} bytes>", p.len())),
            )
            .field("text_service_endpoint", &self.text_service_endpoint)
            .field(
                "text_service_credential",
                &self.text_service_credential.as_ref().map(|_| "<redacted>"),
            )
            .field("text_service_deployment", &self.text_service_deployment)
            .field("webhook_url", &self.webhook_url)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
