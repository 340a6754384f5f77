//! Batch optimization result types

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use transaction_core::{AccountId, CounterpartyId, Currency, SettlementWindow, TransactionId};
use uuid::Uuid;

/// Globally unique batch identifier: `batch_<unix seconds>_<8 hex>`
pub fn new_batch_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("batch_{}_{}", Utc::now().timestamp(), &suffix[..8])
}

/// Solver convergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// Proven optimal
    Optimal,
    /// Best assignment found before a search limit
    BestFound,
}

/// How a batch was formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OptimizationMetrics {
    /// Solved assignment
    Optimized {
        /// Solver name
        solver: String,
        /// Search nodes explored
        nodes_explored: u64,
        /// Convergence status
        convergence: Convergence,
    },
    /// Deterministic fallback grouping
    SimpleGrouping {
        /// Why the solver result was not used
        reason: String,
    },
}

impl OptimizationMetrics {
    /// Whether this batch came from the fallback grouping
    pub fn is_fallback(&self) -> bool {
        matches!(self, OptimizationMetrics::SimpleGrouping { .. })
    }
}

/// Sent/received summary for one counterparty, currency and account pair
///
/// Accounts are ordered so `account_low < account_high`; `sent` flows from
/// `account_low` to `account_high`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettingEntry {
    /// Counterparty
    pub counterparty_id: CounterpartyId,

    /// Source currency of the netted transfers
    pub currency: Currency,

    /// Lexicographically lower account
    pub account_low: AccountId,

    /// Lexicographically higher account
    pub account_high: AccountId,

    /// Total flowing low → high
    pub sent: Decimal,

    /// Total flowing high → low
    pub received: Decimal,

    /// `sent − received`
    pub net: Decimal,

    /// Transfers summarized
    pub transaction_count: usize,
}

/// Result of one batch optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOptimizationResult {
    /// Batch ID
    pub batch_id: String,

    /// Member transactions, in input order
    pub transactions: Vec<TransactionId>,

    /// How the batch was formed
    pub optimization_metrics: OptimizationMetrics,

    /// Cost if every member settled individually
    pub total_cost_before_optimization: Decimal,

    /// Cost with consolidated wires
    pub total_cost_after_optimization: Decimal,

    /// `max(0, before − after)`
    pub cost_savings: Decimal,

    /// `(before − after) / before × 100`, unclamped
    pub cost_savings_percentage: f64,

    /// Window the batch was computed for
    pub settlement_window: SettlementWindow,

    /// Netting summary
    pub netting_details: Vec<NettingEntry>,
}

impl BatchOptimizationResult {
    /// Number of member transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the batch has no members
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_format() {
        let id = new_batch_id();
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "batch");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_batch_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..1000).map(|_| new_batch_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_metrics_serialization() {
        let fallback = OptimizationMetrics::SimpleGrouping {
            reason: "infeasible".to_string(),
        };
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json["method"], "simple_grouping");
        assert!(fallback.is_fallback());

        let solved = OptimizationMetrics::Optimized {
            solver: "branch_and_bound".to_string(),
            nodes_explored: 3,
            convergence: Convergence::Optimal,
        };
        let json = serde_json::to_value(&solved).unwrap();
        assert_eq!(json["method"], "optimized");
        assert_eq!(json["convergence"], "optimal");
    }
}
