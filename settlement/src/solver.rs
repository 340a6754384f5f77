//! Assignment problem and pluggable solver boundary
//!
//! A problem assigns each of `n` items to exactly one of `k` slots, minimizing
//! the summed `cost[item][slot]` subject to linear capacity constraints
//! `Σ coefficient[item][slot] ≤ limit` over the chosen slots.

use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Solver failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// No assignment satisfies the constraints
    #[error("Problem is infeasible: {0}")]
    Infeasible(String),

    /// Node limit reached before any feasible assignment was found
    #[error("Node limit reached after {0} nodes")]
    NodeLimit(u64),

    /// Time limit reached before any feasible assignment was found
    #[error("Time limit of {0:?} reached")]
    TimeLimit(Duration),

    /// Malformed problem
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Solver-internal failure
    #[error("Solver failure: {0}")]
    Internal(String),
}

/// Linear capacity constraint over the assignment
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityConstraint {
    /// Constraint label (e.g. `liquidity:USD`)
    pub name: String,

    /// Coefficient of each (item, slot) assignment
    pub coefficients: Vec<Vec<Decimal>>,

    /// Upper bound on the summed coefficients
    pub limit: Decimal,
}

/// Binary assignment problem
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentProblem {
    slots: usize,
    costs: Vec<Vec<Decimal>>,
    constraints: Vec<CapacityConstraint>,
}

impl AssignmentProblem {
    /// Create a problem from an `items × slots` cost matrix
    pub fn new(slots: usize, costs: Vec<Vec<Decimal>>) -> Result<Self, SolverError> {
        if slots == 0 {
            return Err(SolverError::InvalidProblem("at least one slot is required".to_string()));
        }
        if let Some(item) = costs.iter().position(|row| row.len() != slots) {
            return Err(SolverError::InvalidProblem(format!(
                "cost row {} has {} entries, expected {}",
                item,
                costs[item].len(),
                slots
            )));
        }
        Ok(Self {
            slots,
            costs,
            constraints: Vec::new(),
        })
    }

    /// Add a capacity constraint
    pub fn add_constraint(&mut self, constraint: CapacityConstraint) -> Result<(), SolverError> {
        let shape_ok = constraint.coefficients.len() == self.costs.len()
            && constraint
                .coefficients
                .iter()
                .all(|row| row.len() == self.slots);
        if !shape_ok {
            return Err(SolverError::InvalidProblem(format!(
                "constraint {} does not match the {}×{} problem",
                constraint.name,
                self.costs.len(),
                self.slots
            )));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Number of items
    pub fn items(&self) -> usize {
        self.costs.len()
    }

    /// Number of slots
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Cost of placing `item` in `slot`
    pub fn cost(&self, item: usize, slot: usize) -> Decimal {
        self.costs[item][slot]
    }

    /// Capacity constraints
    pub fn constraints(&self) -> &[CapacityConstraint] {
        &self.constraints
    }

    /// Objective value of a complete assignment
    pub fn objective(&self, slots: &[usize]) -> Decimal {
        slots
            .iter()
            .enumerate()
            .map(|(item, &slot)| self.costs[item][slot])
            .sum()
    }

    /// Whether a complete assignment satisfies every constraint
    pub fn is_feasible(&self, slots: &[usize]) -> bool {
        slots.len() == self.items()
            && slots.iter().all(|&slot| slot < self.slots)
            && self.constraints.iter().all(|c| {
                let used: Decimal = slots
                    .iter()
                    .enumerate()
                    .map(|(item, &slot)| c.coefficients[item][slot])
                    .sum();
                used <= c.limit
            })
    }
}

/// Solution of an assignment problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Chosen slot per item
    pub slots: Vec<usize>,

    /// Objective value
    pub objective: Decimal,

    /// Proven optimal (false when a search limit cut the search short)
    pub optimal: bool,

    /// Search nodes explored
    pub nodes_explored: u64,
}

impl Assignment {
    /// Items placed in `slot`, in item order
    pub fn members(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, &s)| s == slot)
            .map(|(item, _)| item)
    }
}

/// Strategy for solving assignment problems
///
/// Implementations must be stateless across calls so one instance can be shared
/// between concurrent optimizations.
pub trait AssignmentSolver: Send + Sync + std::fmt::Debug {
    /// Solver name reported in batch metrics
    fn name(&self) -> &'static str;

    /// Solve the problem
    fn solve(&self, problem: &AssignmentProblem) -> Result<Assignment, SolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ragged_costs_rejected() {
        let result = AssignmentProblem::new(2, vec![vec![dec!(1), dec!(2)], vec![dec!(1)]]);
        assert!(matches!(result, Err(SolverError::InvalidProblem(_))));
    }

    #[test]
    fn test_zero_slots_rejected() {
        assert!(AssignmentProblem::new(0, vec![]).is_err());
    }

    #[test]
    fn test_constraint_shape_checked() {
        let mut problem = AssignmentProblem::new(2, vec![vec![dec!(1), dec!(2)]]).unwrap();
        let result = problem.add_constraint(CapacityConstraint {
            name: "bad".to_string(),
            coefficients: vec![vec![dec!(1)]],
            limit: dec!(10),
        });
        assert!(result.is_err());
        assert!(problem.constraints().is_empty());
    }

    #[test]
    fn test_objective_and_feasibility() {
        let mut problem = AssignmentProblem::new(
            2,
            vec![vec![dec!(1), dec!(3)], vec![dec!(2), dec!(1)]],
        )
        .unwrap();
        problem
            .add_constraint(CapacityConstraint {
                name: "slot0".to_string(),
                coefficients: vec![vec![dec!(1), dec!(0)], vec![dec!(1), dec!(0)]],
                limit: dec!(1),
            })
            .unwrap();

        assert_eq!(problem.objective(&[0, 1]), dec!(2));
        assert!(problem.is_feasible(&[0, 1]));
        assert!(!problem.is_feasible(&[0, 0]));
        assert!(!problem.is_feasible(&[0]));
    }

    #[test]
    fn test_members() {
        let assignment = Assignment {
            slots: vec![0, 2, 0, 1],
            objective: Decimal::ZERO,
            optimal: true,
            nodes_explored: 4,
        };
        assert_eq!(assignment.members(0).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(assignment.members(1).collect::<Vec<_>>(), vec![3]);
    }
}
