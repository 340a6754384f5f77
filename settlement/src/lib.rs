//! Settlement Batch Optimizer
//!
//! Groups accepted transactions into cost-minimizing settlement batches.
//!
//! # Architecture
//!
//! Each settlement window is optimized independently, in chunks of at most
//! `max_batch_size` transactions:
//!
//! 1. **Cost model**: FX spread on the amount plus a consolidated wire fee
//! 2. **Assignment**: each transaction goes to exactly one of a few logical
//!    sub-batches, subject to per-currency liquidity limits on outflows
//! 3. **Solver**: pluggable [`AssignmentSolver`]; the default is an exact
//!    [`BranchAndBoundSolver`]
//! 4. **Result**: sub-batch #1 with cost accounting and a netting summary
//!
//! Solver failures (infeasible, search limits, panics) fall back to a simple
//! grouping of the first transactions of the chunk.
//!
//! # Example
//!
//! ```no_run
//! use settlement::{BatchOptimizer, Config};
//!
//! # fn run(transactions: Vec<transaction_core::TransactionResponse>) -> settlement::Result<()> {
//! let config = Config::from_env()?;
//! let optimizer = BatchOptimizer::new(&config);
//!
//! for batch in optimizer.optimize(&transactions, None) {
//!     println!("{}: {} transactions, saved {}",
//!              batch.batch_id, batch.transactions.len(), batch.cost_savings);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod branch_bound;
pub mod config;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod netting;
pub mod optimizer;
pub mod solver;
pub mod types;

// Re-exports
pub use branch_bound::BranchAndBoundSolver;
pub use config::Config;
pub use cost::CostModel;
pub use error::{Error, Result};
pub use netting::compute_netting;
pub use optimizer::BatchOptimizer;
pub use solver::{Assignment, AssignmentProblem, AssignmentSolver, CapacityConstraint, SolverError};
pub use types::*;
