use crate::common::{DomainError, DomainResult};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Number of joints every arm in the cell declares limits for.
pub const JOINT_COUNT: usize = 6;

/// Upper bound on arms in one cell.
pub const MAX_ROBOTS: usize = 1024;

/// Exact-coordinate key used by caches and the pickup reservation table.
pub type PointKey = (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, k: f64) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn dot(&self, other: &Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        self.sub(other).norm()
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        self.add(&other.sub(self).scale(t))
    }

    pub fn key(&self) -> PointKey {
        (OrderedFloat(self.x), OrderedFloat(self.y), OrderedFloat(self.z))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    pub min_angle: f64,        // degrees
    pub max_angle: f64,        // degrees
    pub max_velocity: f64,     // deg/s
    pub max_acceleration: f64, // deg/s^2
}

impl JointLimit {
    pub fn new(min_angle: f64, max_angle: f64, max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            min_angle,
            max_angle,
            max_velocity,
            max_acceleration,
        }
    }

    pub fn admits(&self, angle_deg: f64) -> bool {
        self.min_angle <= angle_deg && angle_deg <= self.max_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub pick: Point3,
    pub place: Point3,
    pub dwell_time_ms: u64,
}

impl Operation {
    pub fn new(pick: Point3, place: Point3, dwell_time_ms: u64) -> Self {
        Self {
            pick,
            place,
            dwell_time_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub robot_count: usize,
    pub joint_limits: Vec<JointLimit>,
    pub tool_clearance: f64,
    pub safe_distance: f64,
    pub operations: Vec<Operation>,
    pub robot_bases: Vec<Point3>,
}

impl Problem {
    /// Builds a problem with every robot base at the origin.
    /// Bases are stored only when given; `robot_base` falls back to the origin.
    pub fn new(
        robot_count: usize,
        joint_limits: Vec<JointLimit>,
        tool_clearance: f64,
        safe_distance: f64,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            robot_count,
            joint_limits,
            tool_clearance,
            safe_distance,
            operations,
            robot_bases: Vec::new(),
        }
    }

    pub fn with_robot_bases(mut self, bases: Vec<Point3>) -> Self {
        self.robot_bases = bases;
        self
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Base of `robot`, falling back to the origin when none was given.
    pub fn robot_base(&self, robot: usize) -> Point3 {
        self.robot_bases.get(robot).copied().unwrap_or(Point3::ORIGIN)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.robot_count == 0 {
            return Err(invalid("robot count must be at least 1"));
        }
        if self.robot_count > MAX_ROBOTS {
            return Err(invalid(format!("robot count {} exceeds {}", self.robot_count, MAX_ROBOTS)));
        }
        if self.joint_limits.len() != JOINT_COUNT {
            return Err(invalid(format!(
                "expected {} joint limits, got {}",
                JOINT_COUNT,
                self.joint_limits.len()
            )));
        }
        if self.robot_bases.len() > self.robot_count {
            return Err(invalid(format!(
                "{} robot bases given for {} robots",
                self.robot_bases.len(),
                self.robot_count
            )));
        }
        for (i, joint) in self.joint_limits.iter().enumerate() {
            if !(joint.min_angle.is_finite() && joint.max_angle.is_finite()) || joint.min_angle > joint.max_angle {
                return Err(invalid(format!("joint {} has an empty angle range", i + 1)));
            }
            if !(joint.max_velocity > 0.0 && joint.max_velocity.is_finite()) {
                return Err(invalid(format!("joint {} velocity limit must be positive", i + 1)));
            }
            if !(joint.max_acceleration > 0.0 && joint.max_acceleration.is_finite()) {
                return Err(invalid(format!("joint {} acceleration limit must be positive", i + 1)));
            }
        }
        if !(self.tool_clearance >= 0.0 && self.tool_clearance.is_finite()) {
            return Err(invalid("tool clearance must be non-negative"));
        }
        if !(self.safe_distance >= 0.0 && self.safe_distance.is_finite()) {
            return Err(invalid("safe distance must be non-negative"));
        }
        for (id, op) in self.operations.iter().enumerate() {
            if !op.pick.is_finite() || !op.place.is_finite() {
                return Err(invalid(format!("operation {} has a non-finite coordinate", id)));
            }
        }
        if self.robot_bases.iter().any(|b| !b.is_finite()) {
            return Err(invalid("robot base has a non-finite coordinate"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> DomainError {
    DomainError::InvalidProblem {
        reason: reason.into(),
    }
}
