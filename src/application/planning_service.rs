// Planning Service - runs one scenario through the whole pipeline
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::common::{ApplicationError, ApplicationResult};
use crate::domains::assignment::{
    Assignment, AssignmentModel, AssignmentSolver, BranchAndBoundSolver, FeasibilityMatrix, SolveStatus,
    SolverBudget, UnreachableOperation, DEFAULT_HORIZON_MS,
};
use crate::domains::cell::Problem;
use crate::domains::collision::{CollisionAuditor, CollisionReport};
use crate::domains::kinematics::{operation_duration, ReachabilityMode, ReachabilityOracle};
use crate::domains::logger::DynLogger;
use crate::domains::scheduling::{PathBuilder, PathBuilderOptions, Schedule};

#[derive(Debug, Clone)]
pub struct PlanningSettings {
    pub reachability_mode: ReachabilityMode,
    pub horizon_ms: u64,
    pub budget: SolverBudget,
    pub path: PathBuilderOptions,
    pub auditor: CollisionAuditor,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            reachability_mode: ReachabilityMode::default(),
            horizon_ms: DEFAULT_HORIZON_MS,
            budget: SolverBudget::default(),
            path: PathBuilderOptions::default(),
            auditor: CollisionAuditor::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizerSummary {
    pub solver: String,
    pub status: SolveStatus,
    pub makespan_ms: u64,
    pub max_robot_time_ms: u64,
    pub robot_times_ms: Vec<u64>,
    pub objective: u64,
    pub nodes_explored: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanningReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub robot_count: usize,
    pub operation_count: usize,
    pub reachability_mode: ReachabilityMode,
    pub excluded_operations: Vec<UnreachableOperation>,
    pub operation_durations_ms: Vec<u64>,
    pub assignment: Assignment,
    pub optimizer: OptimizerSummary,
    pub schedule: Schedule,
    pub collisions: CollisionReport,
}

impl PlanningReport {
    /// Makespan of the built schedule, which includes any pickup stalls.
    pub fn makespan_ms(&self) -> u64 {
        self.schedule.makespan_ms()
    }
}

pub struct PlanningService {
    settings: PlanningSettings,
    solver: Box<dyn AssignmentSolver>,
    logger: DynLogger,
}

impl PlanningService {
    pub fn new(settings: PlanningSettings, logger: DynLogger) -> Self {
        Self {
            settings,
            solver: Box::new(BranchAndBoundSolver::new()),
            logger,
        }
    }

    pub fn with_solver(mut self, solver: Box<dyn AssignmentSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn settings(&self) -> &PlanningSettings {
        &self.settings
    }

    /// Raising this flag makes a running solve give up at its next poll.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.settings.budget.cancel.clone()
    }

    pub fn plan(&self, problem: &Problem) -> ApplicationResult<PlanningReport> {
        problem.validate()?;
        self.logger.info(&format!(
            "planning {} operations on {} robots",
            problem.operation_count(),
            problem.robot_count
        ));

        let mut oracle = ReachabilityOracle::new(&problem.joint_limits, self.settings.reachability_mode);
        let feasibility = FeasibilityMatrix::build(problem, &mut oracle);
        let excluded = feasibility.unreachable_operations();
        for entry in &excluded {
            self.logger.warn(&format!(
                "operation {} is not reachable by any robot (pick: {:?}, place: {:?})",
                entry.operation_id, entry.pick_reachable_by, entry.place_reachable_by
            ));
        }

        let durations: Vec<u64> = problem
            .operations
            .iter()
            .map(|op| operation_duration(op, &problem.joint_limits))
            .collect();

        let model = AssignmentModel::new(&feasibility, durations.clone(), self.settings.horizon_ms);
        let solution = self
            .solver
            .solve(&model, &self.settings.budget)
            .inspect_err(|e| self.logger.error(&format!("{} failed: {}", self.solver.name(), e)))?;
        self.logger.info(&format!(
            "{} assigned {} operations, max robot time {} ms ({} nodes, {} ms)",
            self.solver.name(),
            solution.assignment.assigned_count(),
            solution.max_robot_time_ms,
            solution.nodes_explored,
            solution.elapsed_ms
        ));

        let schedule = PathBuilder::new(problem, self.settings.path).build(&solution.assignment);

        let collisions = self.settings.auditor.audit(&schedule, problem.safe_distance);
        for entry in &collisions.entries {
            self.logger.warn(&format!(
                "robots {} and {} come within {:.3} (safe distance {:.3})",
                entry.robot_a, entry.robot_b, entry.min_distance, problem.safe_distance
            ));
        }

        Ok(PlanningReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            robot_count: problem.robot_count,
            operation_count: problem.operation_count(),
            reachability_mode: oracle.mode(),
            excluded_operations: excluded,
            operation_durations_ms: durations,
            assignment: solution.assignment,
            optimizer: OptimizerSummary {
                solver: self.solver.name().to_string(),
                status: solution.status,
                makespan_ms: solution.makespan_ms,
                max_robot_time_ms: solution.max_robot_time_ms,
                robot_times_ms: solution.robot_times_ms,
                objective: solution.objective,
                nodes_explored: solution.nodes_explored,
                elapsed_ms: solution.elapsed_ms,
            },
            schedule,
            collisions,
        })
    }

    /// Runs [`plan`](Self::plan) on the blocking pool. When `timeout` elapses
    /// first the cancel flag is raised and `PipelineTimeout` is returned.
    pub async fn plan_with_timeout(self: Arc<Self>, problem: Problem, timeout: Duration) -> ApplicationResult<PlanningReport> {
        let cancel = self.cancel_handle();
        let service = self.clone();
        let task = tokio::task::spawn_blocking(move || service.plan(&problem));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ApplicationError::PipelineTask(join_error.to_string())),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                self.logger.error(&format!("pipeline timed out after {} ms", timeout.as_millis()));
                Err(ApplicationError::PipelineTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
