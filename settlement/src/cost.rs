//! Settlement cost model
//!
//! Per-transaction cost is an FX spread on the amount plus a wire fee:
//!
//! ```text
//! fx_cost        = amount × spread_bps / 10 000
//! cost_before    = fx_cost + wire_cost
//! cost_after     = fx_cost + wire_cost × (1 − consolidation_discount)
//! ```

use crate::config::CostConfig;
use rust_decimal::Decimal;
use std::collections::HashMap;
use transaction_core::{Currency, TransactionRequest};

/// Quoted spreads in basis points, applied in both directions
fn spread_table() -> HashMap<(Currency, Currency), Decimal> {
    let quoted = [
        (Currency::USD, Currency::EUR, Decimal::new(25, 1)),
        (Currency::USD, Currency::GBP, Decimal::new(30, 1)),
        (Currency::USD, Currency::JPY, Decimal::new(20, 1)),
        (Currency::EUR, Currency::GBP, Decimal::new(20, 1)),
    ];

    let mut table = HashMap::with_capacity(quoted.len() * 2);
    for (a, b, bps) in quoted {
        table.insert((a, b), bps);
        table.insert((b, a), bps);
    }
    table
}

/// Cost model
#[derive(Debug, Clone)]
pub struct CostModel {
    spreads: HashMap<(Currency, Currency), Decimal>,
    default_spread_bps: Decimal,
    wire_cost: Decimal,
    consolidation_discount: Decimal,
}

impl CostModel {
    /// Create cost model with the quoted spread table
    pub fn new(config: &CostConfig) -> Self {
        Self {
            spreads: spread_table(),
            default_spread_bps: config.default_spread_bps,
            wire_cost: config.wire_cost,
            consolidation_discount: config.consolidation_discount,
        }
    }

    /// Spread for a currency pair in basis points
    ///
    /// Same-currency pairs are not quoted and take the default spread.
    pub fn spread_bps(&self, source: Currency, destination: Currency) -> Decimal {
        self.spreads
            .get(&(source, destination))
            .copied()
            .unwrap_or(self.default_spread_bps)
    }

    /// FX spread cost
    pub fn fx_cost(&self, source: Currency, destination: Currency, amount: Decimal) -> Decimal {
        amount * self.spread_bps(source, destination) / Decimal::from(10_000)
    }

    /// Undiscounted wire cost
    pub fn wire_cost(&self) -> Decimal {
        self.wire_cost
    }

    /// Wire cost after consolidation discount
    pub fn discounted_wire_cost(&self) -> Decimal {
        self.wire_cost * (Decimal::ONE - self.consolidation_discount)
    }

    /// Cost of settling a transaction on its own
    pub fn cost_before(&self, transaction: &TransactionRequest) -> Decimal {
        self.fx(transaction) + self.wire_cost()
    }

    /// Cost of settling a transaction inside a consolidated batch
    pub fn cost_after(&self, transaction: &TransactionRequest) -> Decimal {
        self.fx(transaction) + self.discounted_wire_cost()
    }

    fn fx(&self, transaction: &TransactionRequest) -> Decimal {
        self.fx_cost(
            transaction.source_currency,
            transaction.destination_currency,
            transaction.amount,
        )
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(&CostConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quoted_spreads_are_symmetric() {
        let model = CostModel::default();
        assert_eq!(model.spread_bps(Currency::USD, Currency::EUR), dec!(2.5));
        assert_eq!(model.spread_bps(Currency::EUR, Currency::USD), dec!(2.5));
        assert_eq!(model.spread_bps(Currency::GBP, Currency::USD), dec!(3.0));
        assert_eq!(model.spread_bps(Currency::JPY, Currency::USD), dec!(2.0));
        assert_eq!(model.spread_bps(Currency::GBP, Currency::EUR), dec!(2.0));
    }

    #[test]
    fn test_default_spread() {
        let model = CostModel::default();
        assert_eq!(model.spread_bps(Currency::INR, Currency::BRL), dec!(5));
        assert_eq!(model.spread_bps(Currency::USD, Currency::USD), dec!(5));
    }

    #[test]
    fn test_fx_cost() {
        let model = CostModel::default();
        // 1000 × 2.5 / 10000 = 0.25
        assert_eq!(model.fx_cost(Currency::USD, Currency::EUR, dec!(1000)), dec!(0.25));
        // 2000 × 5 / 10000 = 1
        assert_eq!(model.fx_cost(Currency::CHF, Currency::CAD, dec!(2000)), dec!(1));
    }

    #[test]
    fn test_wire_costs() {
        let model = CostModel::default();
        assert_eq!(model.wire_cost(), dec!(5.00));
        assert_eq!(model.discounted_wire_cost(), dec!(4.25));
    }
}
