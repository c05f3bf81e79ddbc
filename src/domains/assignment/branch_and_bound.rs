//! Exact depth-first branch-and-bound for the assignment model.
//!
//! Operations are branched in longest-first order, seeded with a greedy
//! longest-processing-time incumbent. A node is pruned when its bound cannot
//! beat the incumbent:
//!
//! - the current maximum load,
//! - the root bound (longest operation, average load),
//! - for each remaining operation, the cheapest eligible robot it could join.
//!
//! Robots whose feasibility columns are identical are interchangeable, so at
//! each node only one robot per `(column class, current load)` is tried.

use std::time::Instant;

use tracing::debug;

use super::model::{Assignment, AssignmentModel, AssignmentSolution, AssignmentSolver, SolveStatus, SolverBudget};
use crate::common::{DomainError, DomainResult};

const BUDGET_POLL_INTERVAL: u64 = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

struct Search<'a> {
    model: &'a AssignmentModel,
    budget: &'a SolverBudget,
    order: Vec<usize>,
    classes: Vec<usize>,
    loads: Vec<u64>,
    current: Vec<Option<usize>>,
    best: Vec<Option<usize>>,
    best_load: u64,
    lower_bound: u64,
    nodes: u64,
    started: Instant,
    aborted: bool,
}

impl<'a> Search<'a> {
    fn out_of_budget(&self) -> bool {
        if let Some(limit) = self.budget.node_limit {
            if self.nodes >= limit {
                return true;
            }
        }
        if self.nodes % BUDGET_POLL_INTERVAL != 0 {
            return false;
        }
        if self.budget.is_cancelled() {
            return true;
        }
        self.budget
            .time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit)
    }

    fn node_bound(&self, depth: usize, current_max: u64) -> u64 {
        let mut bound = current_max.max(self.lower_bound);
        for &op in &self.order[depth..] {
            let d = self.model.durations[op];
            let cheapest = self.model.eligible[op]
                .iter()
                .map(|&r| self.loads[r] + d)
                .min()
                .unwrap_or(0);
            bound = bound.max(cheapest);
        }
        bound
    }

    fn descend(&mut self, depth: usize, current_max: u64) {
        self.nodes += 1;
        if self.out_of_budget() {
            self.aborted = true;
            return;
        }

        if depth == self.order.len() {
            if current_max < self.best_load {
                self.best = self.current.clone();
                self.best_load = current_max;
            }
            return;
        }

        if self.node_bound(depth, current_max) >= self.best_load {
            return;
        }

        let op = self.order[depth];
        let duration = self.model.durations[op];
        let mut candidates = self.model.eligible[op].clone();
        candidates.sort_by_key(|&r| (self.loads[r], r));

        let mut tried: Vec<(usize, u64)> = Vec::with_capacity(candidates.len());
        for robot in candidates {
            let key = (self.classes[robot], self.loads[robot]);
            if tried.contains(&key) {
                continue;
            }
            tried.push(key);

            let new_load = self.loads[robot] + duration;
            if new_load.max(current_max) >= self.best_load {
                continue;
            }

            self.loads[robot] += duration;
            self.current[op] = Some(robot);
            self.descend(depth + 1, current_max.max(new_load));
            self.loads[robot] -= duration;
            self.current[op] = None;

            if self.aborted || self.best_load <= self.lower_bound {
                return;
            }
        }
    }
}

/// `classes[r]` is the lowest robot index whose eligibility over the
/// assignable operations equals robot `r`'s.
fn robot_classes(model: &AssignmentModel, ops: &[usize]) -> Vec<usize> {
    let column = |r: usize| -> Vec<bool> { ops.iter().map(|&op| model.is_eligible(op, r)).collect() };
    let columns: Vec<Vec<bool>> = (0..model.robot_count).map(column).collect();
    (0..model.robot_count)
        .map(|r| (0..=r).find(|&q| columns[q] == columns[r]).unwrap_or(r))
        .collect()
}

fn greedy(model: &AssignmentModel, order: &[usize]) -> (Vec<Option<usize>>, u64) {
    let mut loads = vec![0u64; model.robot_count];
    let mut robot_of = vec![None; model.operation_count()];
    for &op in order {
        if let Some(&robot) = model.eligible[op].iter().min_by_key(|&&r| (loads[r], r)) {
            loads[robot] += model.durations[op];
            robot_of[op] = Some(robot);
        }
    }
    let max_load = loads.iter().copied().max().unwrap_or(0);
    (robot_of, max_load)
}

fn infeasible(reason: String) -> DomainError {
    DomainError::OptimizerInfeasible { reason }
}

impl AssignmentSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve(&self, model: &AssignmentModel, budget: &SolverBudget) -> DomainResult<AssignmentSolution> {
        let started = Instant::now();
        let ops = model.assignable_operations();

        if let Some(&op) = ops.iter().find(|&&op| model.durations[op] > model.horizon_ms) {
            return Err(infeasible(format!(
                "operation {} needs {} ms, beyond the {} ms horizon",
                op, model.durations[op], model.horizon_ms
            )));
        }
        let lower_bound = model.load_lower_bound();
        if lower_bound > model.horizon_ms {
            return Err(infeasible(format!(
                "robot load of at least {} ms exceeds the {} ms horizon",
                lower_bound, model.horizon_ms
            )));
        }

        let mut order = ops.clone();
        order.sort_by(|&a, &b| {
            model.durations[b]
                .cmp(&model.durations[a])
                .then(model.eligible[a].len().cmp(&model.eligible[b].len()))
                .then(a.cmp(&b))
        });

        let (incumbent, incumbent_load) = greedy(model, &order);
        let mut search = Search {
            model,
            budget,
            classes: robot_classes(model, &ops),
            order,
            loads: vec![0; model.robot_count],
            current: vec![None; model.operation_count()],
            best: incumbent,
            best_load: incumbent_load,
            lower_bound,
            nodes: 0,
            started,
            aborted: false,
        };
        if search.best_load > lower_bound {
            search.descend(0, 0);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            solver = self.name(),
            nodes = search.nodes,
            elapsed_ms,
            best_load = search.best_load,
            lower_bound,
            aborted = search.aborted,
            "assignment search finished"
        );

        let status = if search.aborted {
            let relative_gap = if search.best_load == 0 {
                0.0
            } else {
                (search.best_load - lower_bound) as f64 / search.best_load as f64
            };
            if budget.accept_bounded && relative_gap <= budget.max_relative_gap && search.best_load <= model.horizon_ms {
                SolveStatus::Bounded {
                    lower_bound,
                    relative_gap,
                }
            } else {
                return Err(DomainError::OptimizerTimeout {
                    elapsed_ms,
                    nodes: search.nodes,
                });
            }
        } else {
            SolveStatus::Optimal
        };

        if search.best_load > model.horizon_ms {
            return Err(infeasible(format!(
                "best robot load {} ms exceeds the {} ms horizon",
                search.best_load, model.horizon_ms
            )));
        }

        let assignment = Assignment::from_robots(search.best);
        let robot_times_ms = assignment.robot_times(model);
        let makespan_ms = model.makespan_term();
        Ok(AssignmentSolution {
            assignment,
            makespan_ms,
            max_robot_time_ms: search.best_load,
            robot_times_ms,
            objective: makespan_ms + search.best_load,
            status,
            nodes_explored: search.nodes,
            elapsed_ms,
        })
    }
}
