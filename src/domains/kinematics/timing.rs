use serde::{Deserialize, Serialize};

use crate::domains::cell::{JointLimit, Operation, Point3};

/// Converts joint-space deg/s (deg/s^2) into TCP units/s (units/s^2).
pub const ANGULAR_TO_LINEAR: f64 = 0.01;
pub const MAX_TCP_VELOCITY: f64 = 2.0;
pub const MAX_TCP_ACCELERATION: f64 = 5.0;
pub const SAFETY_MARGIN: f64 = 1.2;
/// Moves shorter than this take no time.
pub const COINCIDENT_EPSILON: f64 = 1e-6;

/// Linear TCP limits derived from the slowest joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TcpLimits {
    pub velocity: f64,
    pub acceleration: f64,
}

impl TcpLimits {
    pub fn from_joints(limits: &[JointLimit]) -> Self {
        let slowest_velocity = limits
            .iter()
            .map(|j| j.max_velocity)
            .fold(f64::INFINITY, f64::min);
        let slowest_acceleration = limits
            .iter()
            .map(|j| j.max_acceleration)
            .fold(f64::INFINITY, f64::min);
        Self {
            velocity: (slowest_velocity * ANGULAR_TO_LINEAR).min(MAX_TCP_VELOCITY),
            acceleration: (slowest_acceleration * ANGULAR_TO_LINEAR).min(MAX_TCP_ACCELERATION),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileShape {
    Coincident,
    /// Accelerates then brakes without reaching cruise speed.
    Triangular,
    Trapezoidal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    pub distance: f64,
    pub shape: ProfileShape,
    pub peak_velocity: f64,
    pub duration_ms: u64,
}

pub fn motion_profile(from: &Point3, to: &Point3, limits: &[JointLimit]) -> MotionProfile {
    let distance = from.distance(to);
    if distance < COINCIDENT_EPSILON {
        return MotionProfile {
            distance,
            shape: ProfileShape::Coincident,
            peak_velocity: 0.0,
            duration_ms: 0,
        };
    }

    let tcp = TcpLimits::from_joints(limits);
    let accel_time = tcp.velocity / tcp.acceleration;
    let accel_distance = 0.5 * tcp.acceleration * accel_time * accel_time;

    let (shape, seconds, peak_velocity) = if distance <= 2.0 * accel_distance {
        (
            ProfileShape::Triangular,
            2.0 * (distance / tcp.acceleration).sqrt(),
            (distance * tcp.acceleration).sqrt(),
        )
    } else {
        let cruise = (distance - 2.0 * accel_distance) / tcp.velocity;
        (ProfileShape::Trapezoidal, 2.0 * accel_time + cruise, tcp.velocity)
    };

    MotionProfile {
        distance,
        shape,
        peak_velocity,
        // float-to-int casts saturate, so a degenerate limit yields u64::MAX
        duration_ms: (seconds * 1000.0 * SAFETY_MARGIN) as u64,
    }
}

/// Travel time in whole milliseconds between two TCP positions.
pub fn movement_time(from: &Point3, to: &Point3, limits: &[JointLimit]) -> u64 {
    motion_profile(from, to, limits).duration_ms
}

/// Pick-to-place travel plus dwell.
pub fn operation_duration(op: &Operation, limits: &[JointLimit]) -> u64 {
    movement_time(&op.pick, &op.place, limits).saturating_add(op.dwell_time_ms)
}
