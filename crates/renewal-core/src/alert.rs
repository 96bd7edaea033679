//! Contract alert records and the per-alert unit of outbound work.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};

/// One contract approaching its expiration date.
///
/// Built by [`AlertLoader`](crate::AlertLoader) from one element of the
/// alert payload and never mutated afterwards. Equality is structural over
/// all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractAlert {
    contract_number: String,
    customer_name: String,
    expires_on: NaiveDate,
    auto_renewal: bool,
}

impl ContractAlert {
    /// `contract_number` must be non-empty; the loader rejects payloads
    /// that violate this before construction.
    pub fn new(
        contract_number: impl Into<String>,
        customer_name: impl Into<String>,
        expires_on: NaiveDate,
        auto_renewal: bool,
    ) -> Self {
        Self {
            contract_number: contract_number.into(),
            customer_name: customer_name.into(),
            expires_on,
            auto_renewal,
        }
    }

    pub fn contract_number(&self) -> &str {
        &self.contract_number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn expires_on(&self) -> NaiveDate {
        self.expires_on
    }

    pub fn auto_renewal(&self) -> bool {
        self.auto_renewal
    }

    /// Whole days from today's local calendar date until `expires_on`.
    ///
    /// Negative once the contract has already expired.
    pub fn days_remaining(&self) -> i64 {
        self.days_remaining_on(Local::now().date_naive())
    }

    /// Whole days from `today` until `expires_on`.
    pub fn days_remaining_on(&self, today: NaiveDate) -> i64 {
        self.expires_on.signed_duration_since(today).num_days()
    }
}

/// A generated reminder bound to the alert it was produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    contract_alert: Arc<ContractAlert>,
    message: String,
    created_at: DateTime<Utc>,
}

impl NotificationContext {
    /// Stamp `message` with the current time.
    pub fn new(contract_alert: Arc<ContractAlert>, message: impl Into<String>) -> Self {
        Self::at(contract_alert, message, Utc::now())
    }

    pub fn at(
        contract_alert: Arc<ContractAlert>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            contract_alert,
            message: message.into(),
            created_at,
        }
    }

    pub fn contract_alert(&self) -> &ContractAlert {
        &self.contract_alert
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
