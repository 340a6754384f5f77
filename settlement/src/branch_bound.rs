//! Exact branch-and-bound assignment solver
//!
//! # Algorithm
//!
//! Depth-first search over items in index order. Each item tries its slots
//! cheapest first (ties toward the lowest slot index), so the first complete
//! assignment is the greedy one and equal-cost problems resolve in one dive.
//!
//! A partial assignment is pruned when:
//! - its cost plus the cheapest completion is not strictly below the incumbent
//! - any constraint would be exceeded even if every remaining item took its
//!   smallest coefficient
//!
//! The search stops early once the incumbent reaches the global lower bound.

use crate::solver::{Assignment, AssignmentProblem, AssignmentSolver, SolverError};
use rust_decimal::Decimal;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often (in nodes) the wall clock is checked
const TIME_CHECK_INTERVAL: u64 = 256;

/// Branch-and-bound solver
#[derive(Debug, Clone)]
pub struct BranchAndBoundSolver {
    max_nodes: u64,
    time_limit: Option<Duration>,
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new(1_000_000, Some(Duration::from_secs(5)))
    }
}

/// Per-solve precomputed bounds
struct Bounds {
    /// Slot visiting order per item
    order: Vec<Vec<usize>>,
    /// `min_cost_suffix[i]` = cheapest completion of items `i..`
    min_cost_suffix: Vec<Decimal>,
    /// `min_coef_suffix[c][i]` = smallest possible usage of constraint `c` by items `i..`
    min_coef_suffix: Vec<Vec<Decimal>>,
}

impl Bounds {
    fn new(problem: &AssignmentProblem) -> Self {
        let n = problem.items();
        let k = problem.slots();

        let order = (0..n)
            .map(|item| {
                let mut slots: Vec<usize> = (0..k).collect();
                // Stable sort keeps the lowest index first among equal costs
                slots.sort_by(|&a, &b| problem.cost(item, a).cmp(&problem.cost(item, b)));
                slots
            })
            .collect::<Vec<_>>();

        let mut min_cost_suffix = vec![Decimal::ZERO; n + 1];
        for item in (0..n).rev() {
            min_cost_suffix[item] = min_cost_suffix[item + 1] + problem.cost(item, order[item][0]);
        }

        let min_coef_suffix = problem
            .constraints()
            .iter()
            .map(|c| {
                let mut suffix = vec![Decimal::ZERO; n + 1];
                for item in (0..n).rev() {
                    let min = c.coefficients[item]
                        .iter()
                        .copied()
                        .min()
                        .unwrap_or(Decimal::ZERO);
                    suffix[item] = suffix[item + 1] + min;
                }
                suffix
            })
            .collect();

        Self {
            order,
            min_cost_suffix,
            min_coef_suffix,
        }
    }
}

impl BranchAndBoundSolver {
    /// Create solver with search limits
    pub fn new(max_nodes: u64, time_limit: Option<Duration>) -> Self {
        Self {
            max_nodes: max_nodes.max(1),
            time_limit,
        }
    }

    /// Create solver from configuration
    pub fn from_config(config: &crate::config::SolverConfig) -> Self {
        Self::new(config.max_nodes, config.time_limit())
    }

    fn search(&self, problem: &AssignmentProblem) -> Result<Assignment, SolverError> {
        let n = problem.items();
        let k = problem.slots();
        let constraints = problem.constraints();
        let bounds = Bounds::new(problem);

        // Root feasibility: even the smallest usage overflows
        for (c, constraint) in constraints.iter().enumerate() {
            if bounds.min_coef_suffix[c][0] > constraint.limit {
                return Err(SolverError::Infeasible(format!(
                    "{} needs at least {} but limit is {}",
                    constraint.name, bounds.min_coef_suffix[c][0], constraint.limit
                )));
            }
        }

        if n == 0 {
            return Ok(Assignment {
                slots: Vec::new(),
                objective: Decimal::ZERO,
                optimal: true,
                nodes_explored: 0,
            });
        }

        let lower_bound = bounds.min_cost_suffix[0];
        let start = Instant::now();

        // Search state, indexed by depth
        let mut next = vec![0usize; n];
        let mut chosen = vec![0usize; n];
        let mut cost = vec![Decimal::ZERO; n + 1];
        let mut usage = vec![vec![Decimal::ZERO; constraints.len()]; n + 1];

        let mut best: Option<(Vec<usize>, Decimal)> = None;
        let mut nodes: u64 = 0;
        let mut limit_hit: Option<SolverError> = None;
        let mut depth = 0usize;

        'search: loop {
            if depth == n {
                let total = cost[n];
                if best.as_ref().map_or(true, |(_, b)| total < *b) {
                    best = Some((chosen.clone(), total));
                    if total == lower_bound {
                        break 'search;
                    }
                }
                depth -= 1;
                continue;
            }

            if next[depth] >= k {
                if depth == 0 {
                    break 'search;
                }
                depth -= 1;
                continue;
            }

            if nodes >= self.max_nodes {
                limit_hit = Some(SolverError::NodeLimit(nodes));
                break 'search;
            }
            if let Some(limit) = self.time_limit {
                if nodes % TIME_CHECK_INTERVAL == 0 && start.elapsed() >= limit {
                    limit_hit = Some(SolverError::TimeLimit(limit));
                    break 'search;
                }
            }

            let slot = bounds.order[depth][next[depth]];
            next[depth] += 1;
            nodes += 1;

            let candidate = cost[depth] + problem.cost(depth, slot);
            if let Some((_, best_cost)) = &best {
                if candidate + bounds.min_cost_suffix[depth + 1] >= *best_cost {
                    // Later slots cost at least as much
                    next[depth] = k;
                    continue;
                }
            }

            for (c, constraint) in constraints.iter().enumerate() {
                let used = usage[depth][c] + constraint.coefficients[depth][slot];
                if used + bounds.min_coef_suffix[c][depth + 1] > constraint.limit {
                    continue 'search;
                }
                usage[depth + 1][c] = used;
            }

            chosen[depth] = slot;
            cost[depth + 1] = candidate;
            depth += 1;
            if depth < n {
                next[depth] = 0;
            }
        }

        debug!(
            "Branch and bound explored {} nodes over {} items in {:?}",
            nodes,
            n,
            start.elapsed()
        );

        match (best, limit_hit) {
            (Some((slots, objective)), limit) => Ok(Assignment {
                slots,
                objective,
                optimal: limit.is_none(),
                nodes_explored: nodes,
            }),
            (None, Some(limit)) => Err(limit),
            (None, None) => Err(SolverError::Infeasible(
                "no assignment satisfies all constraints".to_string(),
            )),
        }
    }
}

impl AssignmentSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(&self, problem: &AssignmentProblem) -> Result<Assignment, SolverError> {
        self.search(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::CapacityConstraint;
    use rust_decimal_macros::dec;

    fn problem(costs: Vec<Vec<Decimal>>) -> AssignmentProblem {
        let slots = costs.first().map_or(1, |row| row.len());
        AssignmentProblem::new(slots, costs).unwrap()
    }

    /// Exhaustive reference optimum
    fn brute_force(problem: &AssignmentProblem) -> Option<Decimal> {
        let n = problem.items();
        let k = problem.slots();
        let mut slots = vec![0usize; n];
        let mut best: Option<Decimal> = None;
        loop {
            if problem.is_feasible(&slots) {
                let objective = problem.objective(&slots);
                if best.map_or(true, |b| objective < b) {
                    best = Some(objective);
                }
            }
            let mut i = 0;
            loop {
                if i == n {
                    return best;
                }
                slots[i] += 1;
                if slots[i] < k {
                    break;
                }
                slots[i] = 0;
                i += 1;
            }
        }
    }

    #[test]
    fn test_equal_costs_go_to_first_slot() {
        let solver = BranchAndBoundSolver::default();
        let p = problem(vec![vec![dec!(4.5); 3]; 50]);

        let assignment = solver.solve(&p).unwrap();
        assert!(assignment.optimal);
        assert!(assignment.slots.iter().all(|&s| s == 0));
        assert_eq!(assignment.objective, dec!(225));
    }

    #[test]
    fn test_picks_cheapest_slot_per_item() {
        let solver = BranchAndBoundSolver::default();
        let p = problem(vec![
            vec![dec!(3), dec!(1), dec!(2)],
            vec![dec!(1), dec!(1), dec!(5)],
            vec![dec!(9), dec!(8), dec!(7)],
        ]);

        let assignment = solver.solve(&p).unwrap();
        assert_eq!(assignment.slots, vec![1, 0, 2]);
        assert_eq!(assignment.objective, dec!(9));
    }

    #[test]
    fn test_constraint_forces_costlier_slot() {
        let solver = BranchAndBoundSolver::default();
        let mut p = problem(vec![vec![dec!(1), dec!(2)], vec![dec!(1), dec!(3)]]);
        // Slot 0 holds at most one item
        p.add_constraint(CapacityConstraint {
            name: "slot0".to_string(),
            coefficients: vec![vec![dec!(1), dec!(0)], vec![dec!(1), dec!(0)]],
            limit: dec!(1),
        })
        .unwrap();

        let assignment = solver.solve(&p).unwrap();
        assert_eq!(assignment.slots, vec![1, 0]);
        assert_eq!(assignment.objective, dec!(3));
        assert!(assignment.optimal);
    }

    #[test]
    fn test_infeasible() {
        let solver = BranchAndBoundSolver::default();
        let mut p = problem(vec![vec![dec!(1); 3]; 2]);
        p.add_constraint(CapacityConstraint {
            name: "liquidity:USD".to_string(),
            coefficients: vec![vec![dec!(100); 3]; 2],
            limit: dec!(150),
        })
        .unwrap();

        assert!(matches!(solver.solve(&p), Err(SolverError::Infeasible(_))));
    }

    #[test]
    fn test_node_limit_without_incumbent() {
        let solver = BranchAndBoundSolver::new(2, None);
        let p = problem(vec![vec![dec!(1); 3]; 10]);

        assert_eq!(solver.solve(&p), Err(SolverError::NodeLimit(2)));
    }

    #[test]
    fn test_node_limit_keeps_incumbent() {
        // The greedy dive ends at [0, 1] (cost 6); the limit stops the search
        // before the optimum [1, 0] (cost 3) is reached
        let solver = BranchAndBoundSolver::new(3, None);
        let mut p = problem(vec![vec![dec!(1), dec!(2)], vec![dec!(1), dec!(5)]]);
        p.add_constraint(CapacityConstraint {
            name: "slot0".to_string(),
            coefficients: vec![vec![dec!(1), dec!(0)], vec![dec!(1), dec!(0)]],
            limit: dec!(1),
        })
        .unwrap();

        let assignment = solver.solve(&p).unwrap();
        assert_eq!(assignment.slots, vec![0, 1]);
        assert_eq!(assignment.objective, dec!(6));
        assert!(!assignment.optimal);

        let exact = BranchAndBoundSolver::default().solve(&p).unwrap();
        assert_eq!(exact.slots, vec![1, 0]);
        assert!(exact.optimal);
    }

    #[test]
    fn test_empty_problem() {
        let solver = BranchAndBoundSolver::default();
        let assignment = solver.solve(&problem(vec![])).unwrap();
        assert!(assignment.slots.is_empty());
        assert_eq!(assignment.objective, Decimal::ZERO);
    }

    #[test]
    fn test_matches_brute_force() {
        let solver = BranchAndBoundSolver::default();
        let costs = vec![
            vec![dec!(5), dec!(2), dec!(4)],
            vec![dec!(1), dec!(6), dec!(3)],
            vec![dec!(2), dec!(2), dec!(1)],
            vec![dec!(7), dec!(3), dec!(3)],
            vec![dec!(4), dec!(4), dec!(2)],
        ];
        let mut p = problem(costs);
        // Slot 2 capacity of two items, slot 1 capacity of one item
        p.add_constraint(CapacityConstraint {
            name: "slot2".to_string(),
            coefficients: vec![vec![dec!(0), dec!(0), dec!(1)]; 5],
            limit: dec!(2),
        })
        .unwrap();
        p.add_constraint(CapacityConstraint {
            name: "slot1".to_string(),
            coefficients: vec![vec![dec!(0), dec!(1), dec!(0)]; 5],
            limit: dec!(1),
        })
        .unwrap();

        let assignment = solver.solve(&p).unwrap();
        assert!(assignment.optimal);
        assert!(p.is_feasible(&assignment.slots));
        assert_eq!(Some(assignment.objective), brute_force(&p));
    }
}
