//! Core transaction types
//!
//! All types are designed for:
//! - Validation at construction (builder and serde share the same checks)
//! - Exact arithmetic (Decimal for money)
//! - Stable JSON encoding (cache entries and bus payloads)

use crate::{FieldError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn check_bounded(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(FieldError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(FieldError::TooLong { field, max });
    }
    Ok(())
}

fn no_extra_check(_value: &str) -> Result<()> {
    Ok(())
}

/// Transaction IDs are alphanumeric once `-` and `_` separators are removed.
fn check_transaction_id(value: &str) -> Result<()> {
    let mut core = value.chars().filter(|c| *c != '-' && *c != '_').peekable();
    if core.peek().is_none() || !core.all(|c| c.is_ascii_alphanumeric()) {
        return Err(FieldError::InvalidFormat {
            field: "transaction_id",
            reason: "must be alphanumeric (with '-' or '_' separators)".to_string(),
        });
    }
    Ok(())
}

macro_rules! bounded_id {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr, $check:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum length in characters
            pub const MAX_LEN: usize = $max;

            /// Create a validated identifier
            pub fn new(id: impl Into<String>) -> Result<Self> {
                let id = id.into();
                check_bounded($field, &id, Self::MAX_LEN)?;
                $check(&id)?;
                Ok(Self(id))
            }

            /// Get as string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = FieldError;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

bounded_id!(
    /// Client-assigned transaction identifier
    TransactionId,
    "transaction_id",
    50,
    check_transaction_id
);

bounded_id!(
    /// Account identifier (IBAN, account number, etc.)
    AccountId,
    "account",
    50,
    no_extra_check
);

bounded_id!(
    /// Counterparty identifier
    ///
    /// Whitespace-only values pass construction; the intake pipeline rejects them.
    CounterpartyId,
    "counterparty_id",
    50,
    no_extra_check
);

bounded_id!(
    /// Client-supplied idempotency key, unique per logical submission
    IdempotencyKey,
    "idempotency_key",
    100,
    no_extra_check
);

/// ISO 4217 currency code (supported set only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
    /// New Zealand Dollar
    NZD,
    /// Chinese Yuan
    CNY,
    /// Indian Rupee
    INR,
    /// South Korean Won
    KRW,
    /// Singapore Dollar
    SGD,
    /// Hong Kong Dollar
    HKD,
    /// Mexican Peso
    MXN,
    /// Brazilian Real
    BRL,
    /// South African Rand
    ZAR,
}

impl Currency {
    /// Every supported currency
    pub const ALL: [Currency; 16] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CHF,
        Currency::CAD,
        Currency::AUD,
        Currency::NZD,
        Currency::CNY,
        Currency::INR,
        Currency::KRW,
        Currency::SGD,
        Currency::HKD,
        Currency::MXN,
        Currency::BRL,
        Currency::ZAR,
    ];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::CNY => "CNY",
            Currency::INR => "INR",
            Currency::KRW => "KRW",
            Currency::SGD => "SGD",
            Currency::HKD => "HKD",
            Currency::MXN => "MXN",
            Currency::BRL => "BRL",
            Currency::ZAR => "ZAR",
        }
    }
}

impl FromStr for Currency {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self> {
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == s)
            .ok_or_else(|| FieldError::UnsupportedCurrency(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Settlement timing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementWindow {
    /// Real-time gross settlement (immediate)
    #[default]
    Rtgs,
    /// Same-day settlement
    T0,
    /// Next-day settlement
    T1,
    /// T+2 settlement
    T2,
}

impl SettlementWindow {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementWindow::Rtgs => "rtgs",
            SettlementWindow::T0 => "t0",
            SettlementWindow::T1 => "t1",
            SettlementWindow::T2 => "t2",
        }
    }
}

impl fmt::Display for SettlementWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction settlement status
///
/// ```text
/// submitted ─┬─> deduped
///            └─> batched -> consensus_pending -> consensus_approved
///                          -> settlement_pending -> settled
/// failed / reversed: reachable from any non-terminal state
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Accepted by intake
    #[default]
    Submitted,
    /// Duplicate submission
    Deduped,
    /// Assigned to a settlement batch
    Batched,
    /// Awaiting consensus
    ConsensusPending,
    /// Consensus reached
    ConsensusApproved,
    /// Awaiting settlement execution
    SettlementPending,
    /// Funds moved
    Settled,
    /// Processing failed
    Failed,
    /// Reversed after acceptance
    Reversed,
}

impl TransactionStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Deduped
                | TransactionStatus::Settled
                | TransactionStatus::Failed
                | TransactionStatus::Reversed
        )
    }

    /// Check a lifecycle transition
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;

        if self.is_terminal() {
            return false;
        }

        matches!(
            (*self, next),
            (_, Failed)
                | (_, Reversed)
                | (Submitted, Deduped)
                | (Submitted, Batched)
                | (Batched, ConsensusPending)
                | (ConsensusPending, ConsensusApproved)
                | (ConsensusApproved, SettlementPending)
                | (SettlementPending, Settled)
        )
    }
}

/// Incoming transaction for settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Transaction ID
    pub transaction_id: TransactionId,

    /// Transfer amount in the source currency
    pub amount: Decimal,

    /// Source currency
    pub source_currency: Currency,

    /// Destination currency
    pub destination_currency: Currency,

    /// Debited account
    pub source_account: AccountId,

    /// Credited account
    pub destination_account: AccountId,

    /// Counterparty
    pub counterparty_id: CounterpartyId,

    /// Idempotency key
    pub idempotency_key: IdempotencyKey,

    /// Requested settlement window
    #[serde(default)]
    pub settlement_window: SettlementWindow,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TransactionRequest {
    /// Start building a request
    pub fn builder() -> TransactionRequestBuilder {
        TransactionRequestBuilder::default()
    }
}

/// Builder applying the static field constraints of [`TransactionRequest`]
#[derive(Debug, Clone, Default)]
pub struct TransactionRequestBuilder {
    transaction_id: Option<String>,
    amount: Option<Decimal>,
    source_currency: Option<String>,
    destination_currency: Option<String>,
    source_account: Option<String>,
    destination_account: Option<String>,
    counterparty_id: Option<String>,
    idempotency_key: Option<String>,
    settlement_window: SettlementWindow,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl TransactionRequestBuilder {
    /// Set transaction ID
    pub fn transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    /// Set amount
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set source and destination currency codes
    pub fn currencies(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_currency = Some(source.into());
        self.destination_currency = Some(destination.into());
        self
    }

    /// Set source and destination accounts
    pub fn accounts(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_account = Some(source.into());
        self.destination_account = Some(destination.into());
        self
    }

    /// Set counterparty
    pub fn counterparty_id(mut self, id: impl Into<String>) -> Self {
        self.counterparty_id = Some(id.into());
        self
    }

    /// Set idempotency key
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Set settlement window
    pub fn settlement_window(mut self, window: SettlementWindow) -> Self {
        self.settlement_window = window;
        self
    }

    /// Add a metadata entry
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Validate fields and build the request
    pub fn build(self) -> Result<TransactionRequest> {
        Ok(TransactionRequest {
            transaction_id: TransactionId::new(
                self.transaction_id.ok_or(FieldError::Missing("transaction_id"))?,
            )?,
            amount: self.amount.ok_or(FieldError::Missing("amount"))?,
            source_currency: self
                .source_currency
                .ok_or(FieldError::Missing("source_currency"))?
                .parse()?,
            destination_currency: self
                .destination_currency
                .ok_or(FieldError::Missing("destination_currency"))?
                .parse()?,
            source_account: AccountId::new(
                self.source_account.ok_or(FieldError::Missing("source_account"))?,
            )?,
            destination_account: AccountId::new(
                self.destination_account
                    .ok_or(FieldError::Missing("destination_account"))?,
            )?,
            counterparty_id: CounterpartyId::new(
                self.counterparty_id.ok_or(FieldError::Missing("counterparty_id"))?,
            )?,
            idempotency_key: IdempotencyKey::new(
                self.idempotency_key.ok_or(FieldError::Missing("idempotency_key"))?,
            )?,
            settlement_window: self.settlement_window,
            metadata: self.metadata,
        })
    }
}

/// Transaction with tracking info, as stored for dedup and published to the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Original request fields (flattened on the wire)
    #[serde(flatten)]
    pub request: TransactionRequest,

    /// Lifecycle status
    #[serde(default)]
    pub status: TransactionStatus,

    /// Settlement batch, once batched
    #[serde(default)]
    pub batch_id: Option<String>,

    /// Settlement time, once settled
    #[serde(default)]
    pub settlement_time: Option<DateTime<Utc>>,

    /// Created timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    /// Source to destination rate
    #[serde(default)]
    pub fx_rate: Option<Decimal>,

    /// Settlement fee
    #[serde(default)]
    pub settlement_fee: Option<Decimal>,
}

impl TransactionResponse {
    /// Wrap an accepted request with status `submitted` and fresh timestamps
    pub fn submitted(request: TransactionRequest) -> Self {
        let now = Utc::now();
        Self {
            request,
            status: TransactionStatus::Submitted,
            batch_id: None,
            settlement_time: None,
            created_at: now,
            updated_at: now,
            fx_rate: None,
            settlement_fee: None,
        }
    }

    /// Transaction ID
    pub fn transaction_id(&self) -> &TransactionId {
        &self.request.transaction_id
    }
}
