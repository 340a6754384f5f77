//! Per-counterparty netting summary
//!
//! # Example
//!
//! ```text
//! bank_a, USD:
//!   acc_1 → acc_2: $100
//!   acc_2 → acc_1: $80
//!
//! entry (acc_1, acc_2): sent $100, received $80, net $20
//! ```

use crate::types::NettingEntry;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use transaction_core::{AccountId, CounterpartyId, Currency, TransactionRequest};

type NettingKey = (CounterpartyId, Currency, AccountId, AccountId);

#[derive(Default)]
struct Totals {
    sent: Decimal,
    received: Decimal,
    count: usize,
}

/// Summarize transfers by counterparty, source currency and account pair
///
/// Entries are sorted by counterparty, currency, then account pair.
pub fn compute_netting<'a, I>(transactions: I) -> Vec<NettingEntry>
where
    I: IntoIterator<Item = &'a TransactionRequest>,
{
    let mut totals: BTreeMap<NettingKey, Totals> = BTreeMap::new();

    for txn in transactions {
        let forward = txn.source_account <= txn.destination_account;
        let (low, high) = if forward {
            (&txn.source_account, &txn.destination_account)
        } else {
            (&txn.destination_account, &txn.source_account)
        };

        let entry = totals
            .entry((
                txn.counterparty_id.clone(),
                txn.source_currency,
                low.clone(),
                high.clone(),
            ))
            .or_default();

        if forward {
            entry.sent += txn.amount;
        } else {
            entry.received += txn.amount;
        }
        entry.count += 1;
    }

    totals
        .into_iter()
        .map(
            |((counterparty_id, currency, account_low, account_high), t)| NettingEntry {
                counterparty_id,
                currency,
                account_low,
                account_high,
                sent: t.sent,
                received: t.received,
                net: t.sent - t.received,
                transaction_count: t.count,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer(from: &str, to: &str, counterparty: &str, currency: &str, amount: Decimal) -> TransactionRequest {
        TransactionRequest::builder()
            .transaction_id(format!("txn_{}_{}", from, to))
            .amount(amount)
            .currencies(currency, "EUR")
            .accounts(from, to)
            .counterparty_id(counterparty)
            .idempotency_key(format!("req_{}_{}", from, to))
            .build()
            .unwrap()
    }

    #[test]
    fn test_bilateral_flows_net() {
        let txns = vec![
            transfer("acc_1", "acc_2", "bank_a", "USD", dec!(100)),
            transfer("acc_2", "acc_1", "bank_a", "USD", dec!(80)),
        ];

        let entries = compute_netting(&txns);
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.account_low.as_str(), "acc_1");
        assert_eq!(entry.account_high.as_str(), "acc_2");
        assert_eq!(entry.sent, dec!(100));
        assert_eq!(entry.received, dec!(80));
        assert_eq!(entry.net, dec!(20));
        assert_eq!(entry.transaction_count, 2);
    }

    #[test]
    fn test_grouped_by_counterparty_and_currency() {
        let txns = vec![
            transfer("acc_1", "acc_2", "bank_b", "USD", dec!(10)),
            transfer("acc_1", "acc_2", "bank_a", "USD", dec!(20)),
            transfer("acc_1", "acc_2", "bank_a", "GBP", dec!(30)),
        ];

        let entries = compute_netting(&txns);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].counterparty_id.as_str(), "bank_a");
        assert_eq!(entries[2].counterparty_id.as_str(), "bank_b");
        assert!(entries.iter().all(|e| e.net == e.sent));
    }

    #[test]
    fn test_reverse_only_flow_is_negative() {
        let txns = vec![transfer("acc_9", "acc_1", "bank_a", "USD", dec!(50))];

        let entries = compute_netting(&txns);
        assert_eq!(entries[0].account_low.as_str(), "acc_1");
        assert_eq!(entries[0].received, dec!(50));
        assert_eq!(entries[0].net, dec!(-50));
    }

    #[test]
    fn test_empty() {
        assert!(compute_netting(&Vec::<TransactionRequest>::new()).is_empty());
    }
}
