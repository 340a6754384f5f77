//! Cross-field business rules for incoming transactions
//!
//! Field formats are already guaranteed by [`TransactionRequest`] construction;
//! these checks cover what a single field cannot express.

use crate::config::LimitConfig;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use transaction_core::{AccountId, TransactionRequest};

/// Business rule violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Amount is zero or negative
    #[error("Amount must be greater than 0 (got {0})")]
    NonPositiveAmount(Decimal),

    /// Amount is above the configured maximum
    #[error("Amount {amount} exceeds maximum limit {max}")]
    AmountExceedsLimit {
        /// Requested amount
        amount: Decimal,
        /// Configured maximum
        max: Decimal,
    },

    /// Source and destination are the same account
    #[error("Source and destination accounts cannot be same ({0})")]
    SameAccount(AccountId),

    /// Counterparty is blank
    #[error("Counterparty ID is required")]
    MissingCounterparty,
}

/// Transaction validator
#[derive(Debug, Clone)]
pub struct TransactionValidator {
    config: LimitConfig,
}

impl TransactionValidator {
    /// Create new validator
    pub fn new(config: LimitConfig) -> Self {
        Self { config }
    }

    /// Check every business rule, reporting the first violation
    pub fn validate(&self, transaction: &TransactionRequest) -> Result<(), ValidationError> {
        if transaction.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(transaction.amount));
        }

        if transaction.amount > self.config.max_amount {
            return Err(ValidationError::AmountExceedsLimit {
                amount: transaction.amount,
                max: self.config.max_amount,
            });
        }

        if transaction.source_account == transaction.destination_account {
            return Err(ValidationError::SameAccount(
                transaction.source_account.clone(),
            ));
        }

        if transaction.counterparty_id.as_str().trim().is_empty() {
            return Err(ValidationError::MissingCounterparty);
        }

        // Same-currency transfers are allowed (FX rate 1.0)
        debug!("Transaction validated: {}", transaction.transaction_id);
        Ok(())
    }
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new(LimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal, source: &str, destination: &str, counterparty: &str) -> TransactionRequest {
        TransactionRequest::builder()
            .transaction_id("txn_001")
            .amount(amount)
            .currencies("USD", "EUR")
            .accounts(source, destination)
            .counterparty_id(counterparty)
            .idempotency_key("req_001")
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_transaction() {
        let validator = TransactionValidator::default();
        assert!(validator
            .validate(&request(dec!(1000.00), "acc_001", "acc_002", "bank_a"))
            .is_ok());
    }

    #[test]
    fn test_invalid_amount() {
        let validator = TransactionValidator::default();

        assert_eq!(
            validator.validate(&request(dec!(-100.00), "acc_001", "acc_002", "bank_a")),
            Err(ValidationError::NonPositiveAmount(dec!(-100.00)))
        );
        assert!(validator
            .validate(&request(Decimal::ZERO, "acc_001", "acc_002", "bank_a"))
            .is_err());
    }

    #[test]
    fn test_amount_limit_is_inclusive() {
        let validator = TransactionValidator::default();

        assert!(validator
            .validate(&request(dec!(999999999.99), "acc_001", "acc_002", "bank_a"))
            .is_ok());
        assert!(matches!(
            validator.validate(&request(dec!(1000000000.00), "acc_001", "acc_002", "bank_a")),
            Err(ValidationError::AmountExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_same_source_destination() {
        let validator = TransactionValidator::default();
        assert!(matches!(
            validator.validate(&request(dec!(1000.00), "acc_001", "acc_001", "bank_a")),
            Err(ValidationError::SameAccount(_))
        ));
    }

    #[test]
    fn test_blank_counterparty() {
        let validator = TransactionValidator::default();
        assert_eq!(
            validator.validate(&request(dec!(1000.00), "acc_001", "acc_002", "   ")),
            Err(ValidationError::MissingCounterparty)
        );
    }
}
