//! Property tests for business validation

use intake_service::{TransactionValidator, ValidationError};
use proptest::prelude::*;
use rust_decimal::Decimal;
use transaction_core::TransactionRequest;

fn request(amount: Decimal, source: &str, destination: &str) -> TransactionRequest {
    TransactionRequest::builder()
        .transaction_id("txn_prop")
        .amount(amount)
        .currencies("USD", "GBP")
        .accounts(source, destination)
        .counterparty_id("bank_a")
        .idempotency_key("req_prop")
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn amounts_within_bounds_pass(cents in 1i64..=99_999_999_999i64) {
        let validator = TransactionValidator::default();
        let amount = Decimal::new(cents, 2);
        prop_assert!(validator.validate(&request(amount, "acc_a", "acc_b")).is_ok());
    }

    #[test]
    fn non_positive_amounts_fail(cents in -99_999_999_999i64..=0i64) {
        let validator = TransactionValidator::default();
        let amount = Decimal::new(cents, 2);
        prop_assert_eq!(
            validator.validate(&request(amount, "acc_a", "acc_b")),
            Err(ValidationError::NonPositiveAmount(amount))
        );
    }

    #[test]
    fn amounts_above_limit_fail(cents in 100_000_000_000i64..1_000_000_000_000i64) {
        let validator = TransactionValidator::default();
        let amount = Decimal::new(cents, 2);
        let result = validator.validate(&request(amount, "acc_a", "acc_b"));
        let rejected = matches!(result, Err(ValidationError::AmountExceedsLimit { .. }));
        prop_assert!(rejected);
    }

    #[test]
    fn same_account_fails(account in "[a-z0-9_]{1,50}") {
        let validator = TransactionValidator::default();
        let result = validator.validate(&request(Decimal::ONE, &account, &account));
        let rejected = matches!(result, Err(ValidationError::SameAccount(_)));
        prop_assert!(rejected);
    }
}
