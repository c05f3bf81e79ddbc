use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::feasibility::FeasibilityMatrix;
use crate::common::DomainResult;

/// Default upper bound of the integer time variables (ms).
pub const DEFAULT_HORIZON_MS: u64 = 1_000_000;

/// Assignment problem handed to a solver.
///
/// Variables `assign[op][robot]` exist only where the robot is eligible.
/// Operations with no eligible robot are kept in `excluded` and take no part
/// in the constraints. The objective is `makespan + max_robot_time` where
/// `makespan >= duration[op]` for every assigned operation and
/// `max_robot_time >= sum of durations assigned to any one robot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentModel {
    pub robot_count: usize,
    pub durations: Vec<u64>,
    pub eligible: Vec<Vec<usize>>,
    pub horizon_ms: u64,
}

impl AssignmentModel {
    pub fn new(feasibility: &FeasibilityMatrix, durations: Vec<u64>, horizon_ms: u64) -> Self {
        let eligible = (0..durations.len())
            .map(|op| feasibility.feasible_robots(op))
            .collect();
        Self {
            robot_count: feasibility.robot_count(),
            durations,
            eligible,
            horizon_ms,
        }
    }

    pub fn operation_count(&self) -> usize {
        self.durations.len()
    }

    pub fn assignable_operations(&self) -> Vec<usize> {
        (0..self.operation_count())
            .filter(|&op| !self.eligible[op].is_empty())
            .collect()
    }

    pub fn excluded_operations(&self) -> Vec<usize> {
        (0..self.operation_count())
            .filter(|&op| self.eligible[op].is_empty())
            .collect()
    }

    pub fn is_eligible(&self, op: usize, robot: usize) -> bool {
        self.eligible.get(op).is_some_and(|robots| robots.contains(&robot))
    }

    /// Lower bound valid for every complete assignment: the longest
    /// assignable operation, and the average robot load.
    pub fn load_lower_bound(&self) -> u64 {
        let assignable = self.assignable_operations();
        let total: u64 = assignable.iter().map(|&op| self.durations[op]).sum();
        let longest = assignable.iter().map(|&op| self.durations[op]).max().unwrap_or(0);
        let k = self.robot_count.max(1) as u64;
        longest.max(total.div_ceil(k))
    }

    /// `makespan` term: longest duration among assignable operations.
    pub fn makespan_term(&self) -> u64 {
        self.assignable_operations()
            .iter()
            .map(|&op| self.durations[op])
            .max()
            .unwrap_or(0)
    }
}

/// Partial map `operation -> robot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    robot_of: Vec<Option<usize>>,
}

impl Assignment {
    pub fn unassigned(operation_count: usize) -> Self {
        Self {
            robot_of: vec![None; operation_count],
        }
    }

    pub fn from_robots(robot_of: Vec<Option<usize>>) -> Self {
        Self { robot_of }
    }

    pub fn assign(&mut self, op: usize, robot: usize) {
        if let Some(slot) = self.robot_of.get_mut(op) {
            *slot = Some(robot);
        }
    }

    pub fn robot_for(&self, op: usize) -> Option<usize> {
        self.robot_of.get(op).copied().flatten()
    }

    /// Operations of `robot` in ascending id order.
    pub fn operations_for(&self, robot: usize) -> Vec<usize> {
        self.robot_of
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == Some(robot))
            .map(|(op, _)| op)
            .collect()
    }

    pub fn assigned_count(&self) -> usize {
        self.robot_of.iter().filter(|r| r.is_some()).count()
    }

    pub fn operation_count(&self) -> usize {
        self.robot_of.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.robot_of
            .iter()
            .enumerate()
            .filter_map(|(op, r)| r.map(|robot| (op, robot)))
    }

    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.robot_of
    }

    /// Domain check: exactly the assignable operations are mapped, each to
    /// an eligible robot.
    pub fn is_consistent_with(&self, model: &AssignmentModel) -> bool {
        self.robot_of.len() == model.operation_count()
            && self.robot_of.iter().enumerate().all(|(op, r)| match r {
                Some(robot) => model.is_eligible(op, *robot),
                None => model.eligible[op].is_empty(),
            })
    }

    pub fn robot_times(&self, model: &AssignmentModel) -> Vec<u64> {
        let mut times = vec![0u64; model.robot_count];
        for (op, robot) in self.iter() {
            if let (Some(t), Some(d)) = (times.get_mut(robot), model.durations.get(op)) {
                *t += d;
            }
        }
        times
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SolveStatus {
    /// Search completed; the objective is proven minimal.
    Optimal,
    /// Budget ran out and the incumbent was accepted within the allowed gap.
    Bounded { lower_bound: u64, relative_gap: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSolution {
    pub assignment: Assignment,
    pub makespan_ms: u64,
    pub max_robot_time_ms: u64,
    pub robot_times_ms: Vec<u64>,
    pub objective: u64,
    pub status: SolveStatus,
    pub nodes_explored: u64,
    pub elapsed_ms: u64,
}

/// Limits for one solver call. The cancel flag may be raised from another
/// thread; the solver polls it.
#[derive(Debug, Clone)]
pub struct SolverBudget {
    pub time_limit: Option<Duration>,
    pub node_limit: Option<u64>,
    pub accept_bounded: bool,
    pub max_relative_gap: f64,
    pub cancel: Arc<AtomicBool>,
}

impl SolverBudget {
    pub fn unlimited() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            accept_bounded: false,
            max_relative_gap: 0.0,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    pub fn accepting_gap(mut self, max_relative_gap: f64) -> Self {
        self.accept_bounded = true;
        self.max_relative_gap = max_relative_gap;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

impl Default for SolverBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Any backend able to solve an [`AssignmentModel`] to proven optimality, or
/// fail with `OptimizerInfeasible` / `OptimizerTimeout`.
pub trait AssignmentSolver: Send + Sync {
    fn name(&self) -> &'static str;
    fn solve(&self, model: &AssignmentModel, budget: &SolverBudget) -> DomainResult<AssignmentSolution>;
}
