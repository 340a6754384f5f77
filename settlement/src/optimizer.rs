//! Batch optimization engine
//!
//! # Pipeline
//!
//! 1. **Partition** by settlement window (first-seen order)
//! 2. **Chunk** each window at `max_batch_size`, preserving input order
//! 3. **Solve** a binary assignment of each chunk to logical sub-batches
//! 4. **Extract** sub-batch #1 as the reported batch
//! 5. **Account** costs and net the members
//!
//! Any solver failure degrades to the deterministic fallback grouping, so
//! [`BatchOptimizer::optimize`] never fails.

use crate::{
    branch_bound::BranchAndBoundSolver,
    config::{BatchingConfig, Config},
    cost::CostModel,
    metrics,
    netting::compute_netting,
    solver::{Assignment, AssignmentProblem, AssignmentSolver, CapacityConstraint, SolverError},
    types::{new_batch_id, BatchOptimizationResult, Convergence, OptimizationMetrics},
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use transaction_core::{Currency, SettlementWindow, TransactionResponse};

/// Sub-batch reported per chunk
const EMITTED_SUB_BATCH: usize = 0;

/// Batch optimizer
///
/// Stateless across calls; one instance can serve concurrent optimizations.
#[derive(Debug, Clone)]
pub struct BatchOptimizer {
    batching: BatchingConfig,
    cost_model: CostModel,
    solver: Arc<dyn AssignmentSolver>,
}

impl BatchOptimizer {
    /// Create optimizer with the branch-and-bound solver
    pub fn new(config: &Config) -> Self {
        Self::with_solver(
            config,
            Arc::new(BranchAndBoundSolver::from_config(&config.solver)),
        )
    }

    /// Create optimizer with a custom solver
    pub fn with_solver(config: &Config, solver: Arc<dyn AssignmentSolver>) -> Self {
        Self {
            batching: config.batching.clone(),
            cost_model: CostModel::new(&config.cost),
            solver,
        }
    }

    /// Cost model in use
    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Group transactions into cost-minimizing settlement batches
    ///
    /// `liquidity` caps, per currency, the total amount leaving in that source
    /// currency across the chunk. Empty input yields no batches.
    pub fn optimize(
        &self,
        transactions: &[TransactionResponse],
        liquidity: Option<&HashMap<Currency, Decimal>>,
    ) -> Vec<BatchOptimizationResult> {
        if transactions.is_empty() {
            return Vec::new();
        }

        let chunk_size = self.batching.max_batch_size.max(1);
        let mut results = Vec::new();

        for (window, group) in group_by_window(transactions) {
            for chunk in group.chunks(chunk_size) {
                if let Some(result) = self.optimize_chunk(chunk, window, liquidity) {
                    results.push(result);
                }
            }
        }

        info!(
            "Optimized {} transactions into {} batches",
            transactions.len(),
            results.len()
        );
        results
    }

    fn optimize_chunk(
        &self,
        chunk: &[&TransactionResponse],
        window: SettlementWindow,
        liquidity: Option<&HashMap<Currency, Decimal>>,
    ) -> Option<BatchOptimizationResult> {
        let start = Instant::now();

        let solved = self
            .build_problem(chunk, liquidity)
            .and_then(|problem| self.run_solver(&problem));

        let result = match solved {
            Ok(assignment) => {
                metrics::SETTLEMENT_SOLVER_NODES.observe(assignment.nodes_explored as f64);
                let convergence = if assignment.optimal {
                    Convergence::Optimal
                } else {
                    Convergence::BestFound
                };
                let members: Vec<&TransactionResponse> = assignment
                    .members(EMITTED_SUB_BATCH)
                    .map(|item| chunk[item])
                    .collect();

                if members.is_empty() {
                    debug!("Sub-batch #1 empty for {} chunk of {}", window, chunk.len());
                    metrics::record_outcome("empty");
                    None
                } else {
                    metrics::record_outcome("optimized");
                    Some(self.build_result(
                        &members,
                        window,
                        OptimizationMetrics::Optimized {
                            solver: self.solver.name().to_string(),
                            nodes_explored: assignment.nodes_explored,
                            convergence,
                        },
                    ))
                }
            }
            Err(e) => {
                warn!(
                    "Solver {} failed on {} chunk of {}: {}; using simple grouping",
                    self.solver.name(),
                    window,
                    chunk.len(),
                    e
                );
                metrics::record_outcome("fallback");
                Some(self.fallback(chunk, window, e.to_string()))
            }
        };

        metrics::SETTLEMENT_OPTIMIZATION_DURATION.observe(start.elapsed().as_secs_f64());
        result
    }

    fn build_problem(
        &self,
        chunk: &[&TransactionResponse],
        liquidity: Option<&HashMap<Currency, Decimal>>,
    ) -> Result<AssignmentProblem, SolverError> {
        let slots = self.batching.sub_batches;
        let costs = chunk
            .iter()
            .map(|txn| vec![self.cost_model.cost_after(&txn.request); slots])
            .collect();
        let mut problem = AssignmentProblem::new(slots, costs)?;

        if let Some(limits) = liquidity {
            let mut limits: Vec<(&Currency, &Decimal)> = limits.iter().collect();
            limits.sort_by_key(|(currency, _)| **currency);

            for (currency, limit) in limits {
                let coefficients = chunk
                    .iter()
                    .map(|txn| {
                        let outflow = if txn.request.source_currency == *currency {
                            txn.request.amount
                        } else {
                            Decimal::ZERO
                        };
                        vec![outflow; slots]
                    })
                    .collect();

                problem.add_constraint(CapacityConstraint {
                    name: format!("liquidity:{}", currency),
                    coefficients,
                    limit: *limit,
                })?;
            }
        }

        Ok(problem)
    }

    /// Run the solver, treating a panic as an internal failure
    fn run_solver(
        &self,
        problem: &AssignmentProblem,
    ) -> Result<Assignment, SolverError> {
        match catch_unwind(AssertUnwindSafe(|| self.solver.solve(problem))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "solver panicked".to_string());
                Err(SolverError::Internal(message))
            }
        }
    }

    fn build_result(
        &self,
        members: &[&TransactionResponse],
        window: SettlementWindow,
        optimization_metrics: OptimizationMetrics,
    ) -> BatchOptimizationResult {
        let before: Decimal = members
            .iter()
            .map(|txn| self.cost_model.cost_before(&txn.request))
            .sum();
        let after: Decimal = members
            .iter()
            .map(|txn| self.cost_model.cost_after(&txn.request))
            .sum();

        let percentage = if before > Decimal::ZERO {
            ((before - after) / before * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let result = BatchOptimizationResult {
            batch_id: new_batch_id(),
            transactions: members
                .iter()
                .map(|txn| txn.transaction_id().clone())
                .collect(),
            optimization_metrics,
            total_cost_before_optimization: before,
            total_cost_after_optimization: after,
            cost_savings: (before - after).max(Decimal::ZERO),
            cost_savings_percentage: percentage,
            settlement_window: window,
            netting_details: compute_netting(members.iter().map(|txn| &txn.request)),
        };

        info!(
            "Batch {} ({}): {} transactions, cost {} → {} ({:.2}% saved)",
            result.batch_id,
            window,
            result.len(),
            before,
            after,
            percentage
        );
        result
    }

    fn fallback(
        &self,
        chunk: &[&TransactionResponse],
        window: SettlementWindow,
        reason: String,
    ) -> BatchOptimizationResult {
        let take = chunk.len().min(self.batching.fallback_batch_size);

        BatchOptimizationResult {
            batch_id: new_batch_id(),
            transactions: chunk[..take]
                .iter()
                .map(|txn| txn.transaction_id().clone())
                .collect(),
            optimization_metrics: OptimizationMetrics::SimpleGrouping { reason },
            total_cost_before_optimization: Decimal::ZERO,
            total_cost_after_optimization: Decimal::ZERO,
            cost_savings: Decimal::ZERO,
            cost_savings_percentage: 0.0,
            settlement_window: window,
            netting_details: Vec::new(),
        }
    }
}

impl Default for BatchOptimizer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Group by window in first-seen order
fn group_by_window(
    transactions: &[TransactionResponse],
) -> Vec<(SettlementWindow, Vec<&TransactionResponse>)> {
    let mut groups: Vec<(SettlementWindow, Vec<&TransactionResponse>)> = Vec::new();

    for txn in transactions {
        let window = txn.request.settlement_window;
        match groups.iter_mut().find(|(w, _)| *w == window) {
            Some((_, members)) => members.push(txn),
            None => groups.push((window, vec![txn])),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use transaction_core::TransactionRequest;

    fn txn(id: &str, amount: Decimal, window: SettlementWindow) -> TransactionResponse {
        TransactionResponse::submitted(
            TransactionRequest::builder()
                .transaction_id(id)
                .amount(amount)
                .currencies("USD", "EUR")
                .accounts("acc_001", "acc_002")
                .counterparty_id("bank_a")
                .idempotency_key(format!("req_{}", id))
                .settlement_window(window)
                .build()
                .unwrap(),
        )
    }

    #[derive(Debug)]
    struct PanickingSolver;

    impl AssignmentSolver for PanickingSolver {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn solve(&self, _problem: &AssignmentProblem) -> Result<Assignment, SolverError> {
            panic!("simulated solver fault")
        }
    }

    #[derive(Debug)]
    struct LastSlotSolver;

    impl AssignmentSolver for LastSlotSolver {
        fn name(&self) -> &'static str {
            "last_slot"
        }

        fn solve(&self, problem: &AssignmentProblem) -> Result<Assignment, SolverError> {
            let slots = vec![problem.slots() - 1; problem.items()];
            Ok(Assignment {
                objective: problem.objective(&slots),
                slots,
                optimal: true,
                nodes_explored: 0,
            })
        }
    }

    #[test]
    fn test_group_by_window_keeps_first_seen_order() {
        let txns = vec![
            txn("t1", dec!(10), SettlementWindow::T1),
            txn("t2", dec!(10), SettlementWindow::Rtgs),
            txn("t3", dec!(10), SettlementWindow::T1),
        ];

        let groups = group_by_window(&txns);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, SettlementWindow::T1);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, SettlementWindow::Rtgs);
    }

    #[test]
    fn test_chunking() {
        let mut config = Config::default();
        config.batching.max_batch_size = 2;
        let optimizer = BatchOptimizer::new(&config);

        let txns: Vec<_> = (0..5)
            .map(|i| txn(&format!("t{}", i), dec!(100), SettlementWindow::Rtgs))
            .collect();

        let results = optimizer.optimize(&txns, None);
        let sizes: Vec<usize> = results.iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(results[2].transactions[0].as_str(), "t4");
    }

    #[test]
    fn test_panicking_solver_falls_back() {
        let optimizer =
            BatchOptimizer::with_solver(&Config::default(), Arc::new(PanickingSolver));
        let txns = vec![txn("t1", dec!(100), SettlementWindow::Rtgs)];

        let results = optimizer.optimize(&txns, None);
        assert_eq!(results.len(), 1);
        assert!(results[0].optimization_metrics.is_fallback());
        assert_eq!(
            results[0].optimization_metrics,
            OptimizationMetrics::SimpleGrouping {
                reason: "Solver failure: simulated solver fault".to_string()
            }
        );
    }

    #[test]
    fn test_empty_first_sub_batch_emits_nothing() {
        let optimizer =
            BatchOptimizer::with_solver(&Config::default(), Arc::new(LastSlotSolver));
        let txns = vec![txn("t1", dec!(100), SettlementWindow::Rtgs)];

        assert!(optimizer.optimize(&txns, None).is_empty());
    }

    #[test]
    fn test_fallback_caps_batch_size() {
        let mut config = Config::default();
        config.batching.fallback_batch_size = 3;
        let optimizer = BatchOptimizer::with_solver(&config, Arc::new(PanickingSolver));
        let txns: Vec<_> = (0..10)
            .map(|i| txn(&format!("t{}", i), dec!(100), SettlementWindow::T2))
            .collect();

        let results = optimizer.optimize(&txns, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].len(), 3);
        assert_eq!(results[0].settlement_window, SettlementWindow::T2);
        assert!(results[0].netting_details.is_empty());
    }
}
