use serde::{Deserialize, Serialize};

use crate::domains::cell::Problem;
use crate::domains::kinematics::ReachabilityOracle;

/// An operation no robot can serve. Excluded from assignment, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreachableOperation {
    pub operation_id: usize,
    /// Robots that reach the pick point (but not the place point).
    pub pick_reachable_by: Vec<usize>,
    /// Robots that reach the place point (but not the pick point).
    pub place_reachable_by: Vec<usize>,
}

/// `feasible[op][robot]`: robot reaches both pick and place of the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeasibilityMatrix {
    robot_count: usize,
    pick: Vec<Vec<bool>>,
    place: Vec<Vec<bool>>,
}

impl FeasibilityMatrix {
    pub fn build(problem: &Problem, oracle: &mut ReachabilityOracle<'_>) -> Self {
        let k = problem.robot_count;
        let mut pick = Vec::with_capacity(problem.operation_count());
        let mut place = Vec::with_capacity(problem.operation_count());

        for op in &problem.operations {
            let mut pick_row = Vec::with_capacity(k);
            let mut place_row = Vec::with_capacity(k);
            for robot in 0..k {
                let base = problem.robot_base(robot);
                pick_row.push(oracle.reachable(robot, &base, &op.pick));
                place_row.push(oracle.reachable(robot, &base, &op.place));
            }
            pick.push(pick_row);
            place.push(place_row);
        }

        Self {
            robot_count: k,
            pick,
            place,
        }
    }

    /// Builds a matrix straight from booleans, pick and place both set.
    pub fn from_rows(robot_count: usize, rows: Vec<Vec<bool>>) -> Self {
        Self {
            robot_count,
            pick: rows.clone(),
            place: rows,
        }
    }

    pub fn robot_count(&self) -> usize {
        self.robot_count
    }

    pub fn operation_count(&self) -> usize {
        self.pick.len()
    }

    pub fn is_feasible(&self, op: usize, robot: usize) -> bool {
        cell(&self.pick, op, robot) && cell(&self.place, op, robot)
    }

    pub fn feasible_robots(&self, op: usize) -> Vec<usize> {
        (0..self.robot_count).filter(|&r| self.is_feasible(op, r)).collect()
    }

    pub fn unreachable_operations(&self) -> Vec<UnreachableOperation> {
        (0..self.operation_count())
            .filter(|&op| self.feasible_robots(op).is_empty())
            .map(|op| UnreachableOperation {
                operation_id: op,
                pick_reachable_by: (0..self.robot_count).filter(|&r| cell(&self.pick, op, r)).collect(),
                place_reachable_by: (0..self.robot_count).filter(|&r| cell(&self.place, op, r)).collect(),
            })
            .collect()
    }
}

fn cell(matrix: &[Vec<bool>], op: usize, robot: usize) -> bool {
    matrix.get(op).and_then(|row| row.get(robot)).copied().unwrap_or(false)
}
