//! Approximate workspace test for a six-axis arm.
//!
//! Only the first three joints are solved: base yaw, shoulder and elbow of a
//! two-link planar chain. The wrist joints are not modeled, so tool
//! orientation is never checked. Every geometric failure is returned as an
//! [`IkFailure`] value and collapses to "unreachable" at the oracle boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domains::cell::{JointLimit, Point3, PointKey};

/// Shoulder-to-elbow link length.
pub const UPPER_ARM_LENGTH: f64 = 0.5;
/// Elbow-to-wrist link length.
pub const FOREARM_LENGTH: f64 = 0.8;
/// Targets closer than this to the shoulder are rejected outright.
pub const MIN_REACH: f64 = 0.1;

/// Strictness of the reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityMode {
    /// Solve the 3-joint model and check joint limits.
    #[default]
    Strict,
    /// Accept every point. Only meant for demo scenarios built without a
    /// kinematic model in mind.
    Permissive,
}

/// Why a target could not be solved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IkFailure {
    TooClose { distance: f64 },
    OutOfReach { distance: f64 },
    InsideInnerRadius { distance: f64 },
    CosineDomain { value: f64 },
    JointLimit { joint: usize, angle: f64 },
    MissingJointLimit { joint: usize },
}

/// Solved angles of the modeled joints, in degrees normalized to [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmAngles {
    pub base: f64,
    pub shoulder: f64,
    pub elbow: f64,
}

impl ArmAngles {
    pub fn as_array(&self) -> [f64; 3] {
        [self.base, self.shoulder, self.elbow]
    }
}

/// Normalizes an angle in degrees into (-180, 180].
pub fn normalize_angle(angle_deg: f64) -> f64 {
    let wrapped = angle_deg.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn solve_arm_angles(target: &Point3, base: &Point3) -> Result<ArmAngles, IkFailure> {
    let local = target.sub(base);
    let r = (local.x * local.x + local.y * local.y).sqrt();
    let z = local.z;
    let distance = (r * r + z * z).sqrt();

    if !distance.is_finite() {
        return Err(IkFailure::OutOfReach { distance });
    }
    if distance < MIN_REACH {
        return Err(IkFailure::TooClose { distance });
    }
    if distance > UPPER_ARM_LENGTH + FOREARM_LENGTH {
        return Err(IkFailure::OutOfReach { distance });
    }
    if distance < (UPPER_ARM_LENGTH - FOREARM_LENGTH).abs() {
        return Err(IkFailure::InsideInnerRadius { distance });
    }

    let l1 = UPPER_ARM_LENGTH;
    let l2 = FOREARM_LENGTH;

    let cos_elbow = (l1 * l1 + l2 * l2 - distance * distance) / (2.0 * l1 * l2);
    if cos_elbow.abs() > 1.0 {
        return Err(IkFailure::CosineDomain { value: cos_elbow });
    }
    let elbow = cos_elbow.acos() - std::f64::consts::PI;

    let cos_shoulder = (l1 * l1 + distance * distance - l2 * l2) / (2.0 * l1 * distance);
    if cos_shoulder.abs() > 1.0 {
        return Err(IkFailure::CosineDomain { value: cos_shoulder });
    }
    let shoulder = z.atan2(r) - cos_shoulder.acos();
    let yaw = local.y.atan2(local.x);

    Ok(ArmAngles {
        base: normalize_angle(yaw.to_degrees()),
        shoulder: normalize_angle(shoulder.to_degrees()),
        elbow: normalize_angle(elbow.to_degrees()),
    })
}

pub fn check_joint_limits(angles: &ArmAngles, limits: &[JointLimit]) -> Result<(), IkFailure> {
    for (joint, angle) in angles.as_array().into_iter().enumerate() {
        let limit = limits
            .get(joint)
            .ok_or(IkFailure::MissingJointLimit { joint })?;
        if !limit.admits(angle) {
            return Err(IkFailure::JointLimit { joint, angle });
        }
    }
    Ok(())
}

/// Full strict check: geometry plus joint limits.
pub fn try_reach(point: &Point3, robot_base: &Point3, limits: &[JointLimit]) -> Result<ArmAngles, IkFailure> {
    let angles = solve_arm_angles(point, robot_base)?;
    check_joint_limits(&angles, limits)?;
    Ok(angles)
}

pub fn is_reachable(point: &Point3, robot_base: &Point3, limits: &[JointLimit]) -> bool {
    try_reach(point, robot_base, limits).is_ok()
}

/// Memoizing front of [`is_reachable`]: each `(robot, point)` pair is
/// evaluated at most once.
pub struct ReachabilityOracle<'a> {
    limits: &'a [JointLimit],
    mode: ReachabilityMode,
    cache: HashMap<(usize, PointKey), bool>,
    evaluations: usize,
}

impl<'a> ReachabilityOracle<'a> {
    pub fn new(limits: &'a [JointLimit], mode: ReachabilityMode) -> Self {
        Self {
            limits,
            mode,
            cache: HashMap::new(),
            evaluations: 0,
        }
    }

    pub fn mode(&self) -> ReachabilityMode {
        self.mode
    }

    pub fn reachable(&mut self, robot: usize, robot_base: &Point3, point: &Point3) -> bool {
        if self.mode == ReachabilityMode::Permissive {
            return true;
        }
        let limits = self.limits;
        let evaluations = &mut self.evaluations;
        *self
            .cache
            .entry((robot, point.key()))
            .or_insert_with(|| {
                *evaluations += 1;
                is_reachable(point, robot_base, limits)
            })
    }

    /// Number of distinct kinematic evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}
