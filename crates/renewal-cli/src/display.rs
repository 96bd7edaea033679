//! Card rendering for `renewal preview`.

use renewal_ai::{FallbackReason, GeneratedMessage, MessageSource};
use renewal_core::ContractAlert;

const RULE: &str = "────────────────────────────────────────";

fn source_label(source: MessageSource) -> &'static str {
    match source {
        MessageSource::Model => "model",
        MessageSource::ModelUnreadable => "model (unreadable answer)",
        MessageSource::Fallback(FallbackReason::Unconfigured) => "fallback (text service not configured)",
        MessageSource::Fallback(FallbackReason::ServiceFailed) => "fallback (text service failed)",
    }
}

pub fn render(alert: &ContractAlert, message: &GeneratedMessage) -> String {
    format!(
        "{RULE}\n\
         contract:     {}\n\
         customer:     {}\n\
         expires on:   {} ({} days)\n\
         auto-renewal: {}\n\
         source:       {}\n\
         \n\
         {}\n",
        alert.contract_number(),
        alert.customer_name(),
        alert.expires_on(),
        alert.days_remaining(),
        if alert.auto_renewal() { "yes" } else { "no" },
        source_label(message.source),
        message.text,
    )
}
