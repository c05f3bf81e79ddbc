use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Invalid problem: {reason}")]
    InvalidProblem { reason: String },

    #[error("Optimizer infeasible: {reason}")]
    OptimizerInfeasible { reason: String },

    #[error("Optimizer timed out after {elapsed_ms} ms ({nodes} nodes explored)")]
    OptimizerTimeout { elapsed_ms: u64, nodes: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

impl DomainError {
    /// True for failures that abort the pipeline before a schedule exists.
    pub fn is_optimizer_failure(&self) -> bool {
        matches!(
            self,
            DomainError::OptimizerInfeasible { .. } | DomainError::OptimizerTimeout { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Pipeline exceeded its {timeout_ms} ms budget")]
    PipelineTimeout { timeout_ms: u64 },

    #[error("Pipeline task failed: {0}")]
    PipelineTask(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
