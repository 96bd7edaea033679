//! Alert payload loading.
//!
//! The payload is a JSON array of objects shaped like
//! `{"contractNumber": "...", "customerName": "...", "expiresOn": "YYYY-MM-DD", "autoRenewal": true}`.
//! A batch is all-or-nothing: one bad element rejects the whole payload.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::alert::ContractAlert;
use crate::events::{EventKind, EventSink, RunEvent};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("malformed alert payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("alert {index} ({contract_number}): unparsable expiresOn {value:?}: {source}")]
    Date {
        index: usize,
        contract_number: String,
        value: String,
        source: chrono::ParseError,
    },
    #[error("alert {index}: contractNumber is empty")]
    EmptyContractNumber { index: usize },
}

impl LoadError {
    /// The contract the error concerns, when the element got that far.
    pub fn contract_number(&self) -> Option<&str> {
        match self {
            LoadError::Date {
                contract_number, ..
            } => Some(contract_number.as_str()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AlertPayload {
    contract_number: String,
    customer_name: String,
    expires_on: String,
    #[serde(default)]
    auto_renewal: bool,
}

/// Parse a complete alert payload, preserving element order.
pub fn parse_alerts(payload: &str) -> Result<Vec<ContractAlert>, LoadError> {
    let payloads: Vec<AlertPayload> = serde_json::from_str(payload)?;
    payloads
        .into_iter()
        .enumerate()
        .map(|(index, p)| to_alert(index, p))
        .collect()
}

fn to_alert(index: usize, p: AlertPayload) -> Result<ContractAlert, LoadError> {
    if p.contract_number.trim().is_empty() {
        return Err(LoadError::EmptyContractNumber { index });
    }
    let expires_on = p
        .expires_on
        .trim()
        .parse::<NaiveDate>()
        .map_err(|source| LoadError::Date {
            index,
            contract_number: p.contract_number.clone(),
            value: p.expires_on.clone(),
            source,
        })?;
    Ok(ContractAlert::new(
        p.contract_number,
        p.customer_name,
        expires_on,
        p.auto_renewal,
    ))
}

/// Turns the configured payload into alerts without ever failing the run.
pub struct AlertLoader {
    payload: Option<String>,
    sink: Arc<dyn EventSink>,
}

impl AlertLoader {
    pub fn new(payload: Option<String>, sink: Arc<dyn EventSink>) -> Self {
        Self { payload, sink }
    }

    /// Every alert in the payload, or none.
    ///
    /// An absent or blank payload is reported at info level; a payload that
    /// fails to parse is reported as a warning. Both yield an empty list.
    pub fn load_expiring_contracts(&self) -> Vec<ContractAlert> {
        let payload = match self.payload.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => {
                self.sink.record(RunEvent::info(
                    EventKind::PayloadMissing,
                    "alert payload is empty; no contracts to process",
                ));
                return Vec::new();
            }
        };

        match parse_alerts(payload) {
            Ok(alerts) => {
                self.sink.record(RunEvent::info(
                    EventKind::AlertsLoaded,
                    format!("loaded {} contract alerts", alerts.len()),
                ));
                alerts
            }
            Err(e) => {
                let mut event = RunEvent::warn(
                    EventKind::PayloadRejected,
                    format!("failed to parse alert payload: {e}"),
                );
                if let Some(number) = e.contract_number() {
                    event = event.with_contract(number);
                }
                self.sink.record(event);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemorySink, Severity};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loader(payload: Option<&str>) -> (AlertLoader, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let loader = AlertLoader::new(payload.map(String::from), sink.clone());
        (loader, sink)
    }

    #[test]
    fn parses_every_element_in_order() {
        let json = r#"[
            {"contractNumber": "C-1", "customerName": "Acme", "expiresOn": "2026-10-21", "autoRenewal": true},
            {"contractNumber": "C-2", "customerName": "Globex", "expiresOn": "2026-11-01", "autoRenewal": false}
        ]"#;
        let alerts = parse_alerts(json).unwrap();
        assert_eq!(
            alerts,
            vec![
                ContractAlert::new("C-1", "Acme", date(2026, 10, 21), true),
                ContractAlert::new("C-2", "Globex", date(2026, 11, 1), false),
            ]
        );
    }

    #[test]
    fn missing_auto_renewal_defaults_to_false() {
        let json = r#"[{"contractNumber": "C-1", "customerName": "Acme", "expiresOn": "2026-10-21"}]"#;
        let alerts = parse_alerts(json).unwrap();
        assert!(!alerts[0].auto_renewal());
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_alerts("[]").unwrap().is_empty());
    }

    #[test]
    fn bad_date_rejects_whole_batch() {
        let json = r#"[
            {"contractNumber": "C-1", "customerName": "Acme", "expiresOn": "2026-10-21", "autoRenewal": true},
            {"contractNumber": "C-2", "customerName": "Globex", "expiresOn": "21.10.2026", "autoRenewal": true}
        ]"#;
        let err = parse_alerts(json).unwrap_err();
        match err {
            LoadError::Date {
                index,
                contract_number,
                value,
                ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(contract_number, "C-2");
                assert_eq!(value, "21.10.2026");
            }
            other => panic!("expected date error, got {other:?}"),
        }
    }

    #[test]
    fn empty_contract_number_is_rejected() {
        let json = r#"[{"contractNumber": " ", "customerName": "Acme", "expiresOn": "2026-10-21", "autoRenewal": true}]"#;
        assert!(matches!(
            parse_alerts(json),
            Err(LoadError::EmptyContractNumber { index: 0 })
        ));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(matches!(parse_alerts(r#"{"contractNumber": "C-1"}"#), Err(LoadError::Json(_))));
        assert!(matches!(
            parse_alerts(r#"[{"contractNumber": "C-1", "expiresOn": "2026-10-21"}]"#),
            Err(LoadError::Json(_))
        ));
        assert!(matches!(
            parse_alerts(r#"[{"contractNumber": "C-1", "customerName": "Acme", "expiresOn": "2026-10-21", "autoRenewal": "yes"}]"#),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn absent_or_blank_payload_yields_nothing_quietly() {
        for payload in [None, Some(""), Some("   ")] {
            let (loader, sink) = loader(payload);
            assert!(loader.load_expiring_contracts().is_empty());
            assert_eq!(sink.kinds(), vec![EventKind::PayloadMissing]);
            assert!(sink.warnings().is_empty());
        }
    }

    #[test]
    fn malformed_payload_yields_nothing_with_warning() {
        let (loader, sink) = loader(Some("[{not json"));
        assert!(loader.load_expiring_contracts().is_empty());
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PayloadRejected);
        assert_eq!(events[0].severity, Severity::Warn);
        assert!(events[0].contract.is_none());
    }

    #[test]
    fn rejected_date_names_the_contract() {
        let (loader, sink) = loader(Some(
            r#"[{"contractNumber": "C-9", "customerName": "Acme", "expiresOn": "soon", "autoRenewal": true}]"#,
        ));
        assert!(loader.load_expiring_contracts().is_empty());
        let events = sink.events();
        assert_eq!(events[0].kind, EventKind::PayloadRejected);
        assert_eq!(events[0].contract.as_deref(), Some("C-9"));
    }

    #[test]
    fn valid_payload_reports_count() {
        let (loader, sink) = loader(Some(
            r#"[{"contractNumber": "C-1", "customerName": "Acme", "expiresOn": "2026-10-21", "autoRenewal": true}]"#,
        ));
        assert_eq!(loader.load_expiring_contracts().len(), 1);
        let events = sink.events();
        assert_eq!(events[0].kind, EventKind::AlertsLoaded);
        assert_eq!(events[0].detail, "loaded 1 contract alerts");
    }
}
