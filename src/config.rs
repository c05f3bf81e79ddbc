use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use anyhow::Result;

use crate::application::PlanningSettings;
use crate::domains::assignment::{SolverBudget, DEFAULT_HORIZON_MS};
use crate::domains::collision::{AcceleratedPathCheck, AuditMode, CollisionAuditor};
use crate::domains::kinematics::ReachabilityMode;
use crate::domains::scheduling::{PathBuilderOptions, VIA_FRACTION, VIA_OFFSET};

pub const ENV_PREFIX: &str = "ARMCELL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reachability: ReachabilityConfig,
    pub optimizer: OptimizerConfig,
    pub path: PathConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    pub mode: ReachabilityMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub time_limit_ms: u64,
    pub node_limit: Option<u64>,
    pub horizon_ms: u64,
    /// Accept the incumbent when the budget runs out, if within `max_relative_gap`.
    pub accept_bounded: bool,
    pub max_relative_gap: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
            node_limit: None,
            horizon_ms: DEFAULT_HORIZON_MS,
            accept_bounded: false,
            max_relative_gap: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub via_points: bool,
    pub via_fraction: f64,
    pub via_offset: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            via_points: true,
            via_fraction: VIA_FRACTION,
            via_offset: VIA_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub mode: AuditMode,
    pub accelerated: bool,
    pub stride: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            mode: AuditMode::Spatial,
            accelerated: false,
            stride: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Layers an optional TOML file under `ARMCELL__SECTION__KEY` environment
    /// overrides, on top of the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let config: Config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let gap = self.optimizer.max_relative_gap;
        if !gap.is_finite() || gap < 0.0 {
            anyhow::bail!("optimizer.max_relative_gap must be a non-negative number, got {}", gap);
        }
        let fraction = self.path.via_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            anyhow::bail!("path.via_fraction must lie in [0, 1], got {}", fraction);
        }
        if self.pipeline.timeout_ms == 0 {
            anyhow::bail!("pipeline.timeout_ms must be positive");
        }
        Ok(())
    }

    pub fn solver_budget(&self) -> SolverBudget {
        let opt = &self.optimizer;
        let mut budget = SolverBudget::unlimited().with_time_limit(Duration::from_millis(opt.time_limit_ms));
        if let Some(nodes) = opt.node_limit {
            budget = budget.with_node_limit(nodes);
        }
        if opt.accept_bounded {
            budget = budget.accepting_gap(opt.max_relative_gap);
        }
        budget
    }

    pub fn path_options(&self) -> PathBuilderOptions {
        PathBuilderOptions {
            via_points: self.path.via_points,
            via_fraction: self.path.via_fraction,
            via_offset: self.path.via_offset,
        }
    }

    pub fn auditor(&self) -> CollisionAuditor {
        let auditor = CollisionAuditor::new(self.audit.mode);
        if self.audit.accelerated {
            auditor.with_accelerator(AcceleratedPathCheck::new(self.audit.stride))
        } else {
            auditor
        }
    }

    pub fn planning_settings(&self) -> PlanningSettings {
        PlanningSettings {
            reachability_mode: self.reachability.mode,
            horizon_ms: self.optimizer.horizon_ms,
            budget: self.solver_budget(),
            path: self.path_options(),
            auditor: self.auditor(),
        }
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline.timeout_ms)
    }
}
