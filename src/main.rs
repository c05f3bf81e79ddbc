use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use armcell::adapters::outbound::{
    init_run_logger, init_tracing, render_schedule, write_json_report, write_schedule, FilesystemDataSource,
};
use armcell::application::PlanningService;
use armcell::domains::collision::AuditMode;
use armcell::domains::kinematics::{try_reach, ReachabilityMode};
use armcell::domains::cell::Point3;
use armcell::domains::logger::FileLogger;
use armcell::{ApplicationResult, Config};

#[derive(Parser, Clone)]
#[command(author, version, about = "armcell - multi-arm pick-and-place planner")]
struct Args {
    /// TOML configuration file; ARMCELL__* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Assign, schedule and audit the operations of a scenario
    Plan {
        /// Scenario file, or a name under ARMCELL_SCENARIO_DIR
        scenario: String,
        /// Write the schedule here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the full JSON planning report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Treat every point as reachable by every arm
        #[arg(long)]
        permissive: bool,
        /// Only flag arms that are close at the same time
        #[arg(long)]
        temporal: bool,
    },
    /// Report which arms of a scenario can reach a point
    Reach {
        scenario: String,
        x: f64,
        y: f64,
        z: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing("info") {
        eprintln!("armcell: {}", e);
    }

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("armcell: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> ApplicationResult<()> {
    let mut config = Config::load(args.config.as_deref())?;
    info!("Configuration loaded successfully");

    let data_source = FilesystemDataSource::new(None);

    match args.command {
        CliCommand::Plan {
            scenario,
            output,
            report,
            permissive,
            temporal,
        } => {
            if permissive {
                config.reachability.mode = ReachabilityMode::Permissive;
            }
            if temporal {
                config.audit.mode = AuditMode::Temporal;
            }
            plan(&config, &data_source, &scenario, output.as_deref(), report.as_deref()).await
        }
        CliCommand::Reach { scenario, x, y, z } => {
            let problem = data_source.load_problem(&scenario)?;
            let point = Point3::new(x, y, z);
            for robot in 0..problem.robot_count {
                match try_reach(&point, &problem.robot_base(robot), &problem.joint_limits) {
                    Ok(angles) => println!(
                        "R{} reachable base={:.2} shoulder={:.2} elbow={:.2}",
                        robot, angles.base, angles.shoulder, angles.elbow
                    ),
                    Err(reason) => println!("R{} unreachable ({:?})", robot, reason),
                }
            }
            Ok(())
        }
    }
}

async fn plan(
    config: &Config,
    data_source: &FilesystemDataSource,
    scenario: &str,
    output: Option<&Path>,
    report: Option<&Path>,
) -> ApplicationResult<()> {
    let logger = init_run_logger(config.logging.file.as_deref(), &config.logging.level, scenario);
    let problem = data_source.load_problem(scenario)?;
    info!(
        "Loaded {} with {} robots and {} operations",
        scenario,
        problem.robot_count,
        problem.operation_count()
    );

    let service = Arc::new(PlanningService::new(config.planning_settings(), logger));
    let result = service
        .plan_with_timeout(problem, config.pipeline_timeout())
        .await;
    if config.logging.file.is_some() {
        FileLogger::flush();
    }
    let result = result?;

    match output {
        Some(path) => write_schedule(path, &result.schedule)?,
        None => print!("{}", render_schedule(&result.schedule)),
    }
    if let Some(path) = report {
        write_json_report(path, &result)?;
        info!("Report written to {}", path.display());
    }

    info!(
        "Run {} finished: makespan {} ms, {} excluded, {} colliding pairs",
        result.run_id,
        result.makespan_ms(),
        result.excluded_operations.len(),
        result.collisions.entries.len()
    );
    for (a, b) in result.collisions.pairs() {
        warn!("R{} and R{} violate the safe distance", a, b);
    }
    Ok(())
}
