use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{DomainError, DomainResult};
use crate::domains::cell::{JointLimit, Operation, Point3, Problem, ScenarioDataSource, JOINT_COUNT, MAX_ROBOTS};

pub const SCENARIO_DIR_ENV: &str = "ARMCELL_SCENARIO_DIR";

/// Resolve the scenario directory.
/// Precedence: ARMCELL_SCENARIO_DIR env var -> ./scenarios -> /usr/share/armcell/scenarios
pub fn resolve_scenario_dir() -> PathBuf {
    if let Ok(v) = env::var(SCENARIO_DIR_ENV) {
        return PathBuf::from(v);
    }
    let cwd_default = Path::new("scenarios");
    if cwd_default.exists() {
        return cwd_default.to_path_buf();
    }
    PathBuf::from("/usr/share/armcell/scenarios")
}

pub struct FilesystemDataSource {
    base: PathBuf,
}

impl FilesystemDataSource {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self {
            base: base.unwrap_or_else(resolve_scenario_dir),
        }
    }

    /// A name that points at an existing file is used as is; anything else is
    /// looked up under the scenario directory.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let direct = Path::new(name);
        if direct.is_file() {
            direct.to_path_buf()
        } else {
            self.base.join(name)
        }
    }

    pub fn load_problem(&self, name: &str) -> DomainResult<Problem> {
        parse_scenario(&self.load_scenario(name)?)
    }
}

impl ScenarioDataSource for FilesystemDataSource {
    fn load_scenario(&self, name: &str) -> DomainResult<String> {
        let path = self.resolve(name);
        fs::read_to_string(&path)
            .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))
    }
}

struct ScenarioLines<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> ScenarioLines<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, raw)| (i + 1, raw.split('#').next().unwrap_or("").trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();
        Self { lines, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.lines.len() - self.pos
    }

    fn end_line(&self) -> usize {
        self.lines.last().map(|(n, _)| n + 1).unwrap_or(1)
    }

    fn next_fields(&mut self, expected: usize, what: &str) -> DomainResult<(usize, Vec<&'a str>)> {
        let Some(&(line, text)) = self.lines.get(self.pos) else {
            return Err(parse_error(self.end_line(), format!("unexpected end of input, expected {}", what)));
        };
        self.pos += 1;
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != expected {
            return Err(parse_error(
                line,
                format!("{} needs {} values, found {}", what, expected, fields.len()),
            ));
        }
        Ok((line, fields))
    }

    fn next_floats(&mut self, expected: usize, what: &str) -> DomainResult<(usize, Vec<f64>)> {
        let (line, fields) = self.next_fields(expected, what)?;
        let values = fields
            .iter()
            .map(|f| {
                f.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| parse_error(line, format!("'{}' is not a finite number in {}", f, what)))
            })
            .collect::<DomainResult<Vec<f64>>>()?;
        Ok((line, values))
    }
}

fn parse_error(line: usize, reason: impl Into<String>) -> DomainError {
    DomainError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Parses the scenario text format:
///
/// ```text
/// K N
/// min max vmax amax        (x6, one per joint)
/// tool_clearance safe_distance
/// px py pz qx qy qz dwell  (xN, dwell in ms)
/// bx by bz                 (optional, xK robot bases)
/// ```
///
/// Blank lines and `#` comments are ignored.
pub fn parse_scenario(text: &str) -> DomainResult<Problem> {
    let mut lines = ScenarioLines::new(text);

    let (line, header) = lines.next_fields(2, "header 'K N'")?;
    let count = |s: &str, what: &str| {
        s.parse::<usize>()
            .map_err(|_| parse_error(line, format!("{} must be a non-negative integer, got '{}'", what, s)))
    };
    let robot_count = count(header[0], "robot count")?;
    let operation_count = count(header[1], "operation count")?;
    if robot_count == 0 {
        return Err(parse_error(line, "robot count must be at least 1"));
    }
    if robot_count > MAX_ROBOTS {
        return Err(parse_error(
            line,
            format!("robot count {} exceeds {}", robot_count, MAX_ROBOTS),
        ));
    }
    // one line per operation must follow
    if operation_count > lines.remaining() {
        return Err(parse_error(
            line,
            format!(
                "operation count {} exceeds the {} lines that follow",
                operation_count,
                lines.remaining()
            ),
        ));
    }

    let mut joint_limits = Vec::with_capacity(JOINT_COUNT);
    for joint in 1..=JOINT_COUNT {
        let (_, v) = lines.next_floats(4, &format!("joint {} limits", joint))?;
        joint_limits.push(JointLimit::new(v[0], v[1], v[2], v[3]));
    }

    let (_, v) = lines.next_floats(2, "'tool_clearance safe_distance'")?;
    let (tool_clearance, safe_distance) = (v[0], v[1]);

    let mut operations = Vec::with_capacity(operation_count);
    for op in 0..operation_count {
        let (line, v) = lines.next_floats(7, &format!("operation {}", op))?;
        if v[6] < 0.0 {
            return Err(parse_error(line, format!("operation {} has a negative dwell time", op)));
        }
        operations.push(Operation::new(
            Point3::new(v[0], v[1], v[2]),
            Point3::new(v[3], v[4], v[5]),
            v[6].round() as u64,
        ));
    }

    let mut problem = Problem::new(robot_count, joint_limits, tool_clearance, safe_distance, operations);

    match lines.remaining() {
        0 => {}
        n if n == robot_count => {
            let mut bases = Vec::with_capacity(robot_count);
            for robot in 0..robot_count {
                let (_, v) = lines.next_floats(3, &format!("robot {} base", robot))?;
                bases.push(Point3::new(v[0], v[1], v[2]));
            }
            problem = problem.with_robot_bases(bases);
        }
        n => {
            let line = lines.lines[lines.pos].0;
            return Err(parse_error(
                line,
                format!("expected 0 or {} robot base lines, found {}", robot_count, n),
            ));
        }
    }

    problem.validate()?;
    Ok(problem)
}
