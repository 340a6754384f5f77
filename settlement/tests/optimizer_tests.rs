//! Batch optimizer scenarios

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use settlement::{
    Assignment, AssignmentProblem, AssignmentSolver, BatchOptimizer, Config, Convergence,
    OptimizationMetrics, SolverError,
};
use std::collections::HashMap;
use std::sync::Arc;
use transaction_core::{Currency, SettlementWindow, TransactionRequest, TransactionResponse};

fn txn(
    id: &str,
    amount: Decimal,
    source: &str,
    destination: &str,
    window: SettlementWindow,
) -> TransactionResponse {
    TransactionResponse::submitted(
        TransactionRequest::builder()
            .transaction_id(id)
            .amount(amount)
            .currencies(source, destination)
            .accounts("acc_001", "acc_002")
            .counterparty_id("bank_a")
            .idempotency_key(format!("req_{}", id))
            .settlement_window(window)
            .build()
            .unwrap(),
    )
}

#[derive(Debug)]
struct FailingSolver;

impl AssignmentSolver for FailingSolver {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn solve(&self, _problem: &AssignmentProblem) -> Result<Assignment, SolverError> {
        Err(SolverError::Internal("dependency unavailable".to_string()))
    }
}

#[test]
fn test_usd_eur_pair_scenario() {
    let optimizer = BatchOptimizer::default();
    let txns = vec![
        txn("A", dec!(1000), "USD", "EUR", SettlementWindow::Rtgs),
        txn("B", dec!(2000), "USD", "EUR", SettlementWindow::Rtgs),
    ];

    let results = optimizer.optimize(&txns, None);
    assert_eq!(results.len(), 1);

    let batch = &results[0];
    let ids: Vec<&str> = batch.transactions.iter().map(|t| t.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    // FX: 0.25 + 0.50; wire 2 × 5.00 vs 2 × 4.25
    assert_eq!(batch.total_cost_before_optimization, dec!(10.75));
    assert_eq!(batch.total_cost_after_optimization, dec!(9.25));
    assert_eq!(batch.cost_savings, dec!(1.50));
    assert!(batch.cost_savings > Decimal::ZERO);
    assert!((batch.cost_savings_percentage - 13.953488).abs() < 1e-4);
    assert_eq!(batch.settlement_window, SettlementWindow::Rtgs);

    match &batch.optimization_metrics {
        OptimizationMetrics::Optimized {
            solver,
            convergence,
            ..
        } => {
            assert_eq!(solver, "branch_and_bound");
            assert_eq!(*convergence, Convergence::Optimal);
        }
        other => panic!("unexpected metrics: {:?}", other),
    }

    assert_eq!(batch.netting_details.len(), 1);
    assert_eq!(batch.netting_details[0].sent, dec!(3000));
    assert_eq!(batch.netting_details[0].transaction_count, 2);
}

#[test]
fn test_empty_input() {
    let optimizer = BatchOptimizer::default();
    assert!(optimizer.optimize(&[], None).is_empty());

    let limits = HashMap::from([(Currency::USD, dec!(1))]);
    assert!(optimizer.optimize(&[], Some(&limits)).is_empty());
}

#[test]
fn test_failing_solver_falls_back() {
    let optimizer = BatchOptimizer::with_solver(&Config::default(), Arc::new(FailingSolver));
    let txns: Vec<_> = (0..150)
        .map(|i| txn(&format!("t{}", i), dec!(10), "USD", "GBP", SettlementWindow::T1))
        .collect();

    let results = optimizer.optimize(&txns, None);
    assert_eq!(results.len(), 1);

    let batch = &results[0];
    assert_eq!(batch.transactions.len(), 100);
    assert_eq!(batch.transactions[0].as_str(), "t0");
    assert_eq!(batch.transactions[99].as_str(), "t99");
    assert!(batch.optimization_metrics.is_fallback());
    assert_eq!(batch.total_cost_before_optimization, Decimal::ZERO);
    assert_eq!(batch.total_cost_after_optimization, Decimal::ZERO);
    assert_eq!(batch.cost_savings, Decimal::ZERO);
    assert_eq!(batch.cost_savings_percentage, 0.0);
}

#[test]
fn test_liquidity_within_limit() {
    let optimizer = BatchOptimizer::default();
    let txns = vec![
        txn("A", dec!(1000), "USD", "EUR", SettlementWindow::Rtgs),
        txn("B", dec!(2000), "USD", "EUR", SettlementWindow::Rtgs),
        txn("C", dec!(500), "GBP", "EUR", SettlementWindow::Rtgs),
    ];
    let limits = HashMap::from([(Currency::USD, dec!(3000)), (Currency::GBP, dec!(500))]);

    let results = optimizer.optimize(&txns, Some(&limits));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].transactions.len(), 3);
    assert!(!results[0].optimization_metrics.is_fallback());
}

#[test]
fn test_liquidity_exceeded_falls_back() {
    let optimizer = BatchOptimizer::default();
    let txns = vec![
        txn("A", dec!(1000), "USD", "EUR", SettlementWindow::Rtgs),
        txn("B", dec!(2000), "USD", "EUR", SettlementWindow::Rtgs),
    ];
    let limits = HashMap::from([(Currency::USD, dec!(2999.99))]);

    let results = optimizer.optimize(&txns, Some(&limits));
    assert_eq!(results.len(), 1);
    assert!(results[0].optimization_metrics.is_fallback());
    assert_eq!(results[0].transactions.len(), 2);
}

#[test]
fn test_destination_currency_is_not_limited() {
    let optimizer = BatchOptimizer::default();
    let txns = vec![txn("A", dec!(1000), "USD", "EUR", SettlementWindow::Rtgs)];
    let limits = HashMap::from([(Currency::EUR, Decimal::ZERO)]);

    let results = optimizer.optimize(&txns, Some(&limits));
    assert!(!results[0].optimization_metrics.is_fallback());
}

#[test]
fn test_windows_are_optimized_separately() {
    let optimizer = BatchOptimizer::default();
    let txns = vec![
        txn("r1", dec!(100), "USD", "EUR", SettlementWindow::Rtgs),
        txn("n1", dec!(100), "USD", "EUR", SettlementWindow::T1),
        txn("r2", dec!(100), "USD", "EUR", SettlementWindow::Rtgs),
    ];

    let results = optimizer.optimize(&txns, None);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].settlement_window, SettlementWindow::Rtgs);
    assert_eq!(results[0].transactions.len(), 2);
    assert_eq!(results[1].settlement_window, SettlementWindow::T1);
    assert_ne!(results[0].batch_id, results[1].batch_id);
}

#[test]
fn test_result_serializes() {
    let optimizer = BatchOptimizer::default();
    let txns = vec![txn("A", dec!(1000), "USD", "EUR", SettlementWindow::T0)];

    let results = optimizer.optimize(&txns, None);
    let json = serde_json::to_value(&results[0]).unwrap();

    assert_eq!(json["settlement_window"], "t0");
    assert_eq!(json["optimization_metrics"]["method"], "optimized");
    assert_eq!(json["transactions"][0], "A");
    assert!(json["batch_id"].as_str().unwrap().starts_with("batch_"));
}
