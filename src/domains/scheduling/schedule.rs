use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domains::cell::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaypointKind {
    Base,
    Via,
    Hold, // waiting for a shared pickup to free up
    Pick,
    Place,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub timestamp_ms: u64,
    pub position: Point3,
    pub kind: WaypointKind,
    pub operation_id: Option<usize>,
}

impl Waypoint {
    pub fn base(position: Point3) -> Self {
        Self {
            timestamp_ms: 0,
            position,
            kind: WaypointKind::Base,
            operation_id: None,
        }
    }

    pub fn at(timestamp_ms: u64, position: Point3, kind: WaypointKind, operation_id: usize) -> Self {
        Self {
            timestamp_ms,
            position,
            kind,
            operation_id: Some(operation_id),
        }
    }
}

/// Timed waypoints of one robot. `finish_ms` includes the final dwell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotTrack {
    pub robot_id: usize,
    pub waypoints: Vec<Waypoint>,
    pub finish_ms: u64,
}

impl RobotTrack {
    pub fn new(robot_id: usize, base: Point3) -> Self {
        Self {
            robot_id,
            waypoints: vec![Waypoint::base(base)],
            finish_ms: 0,
        }
    }

    pub fn polyline(&self) -> Vec<Point3> {
        self.waypoints.iter().map(|w| w.position).collect()
    }

    pub fn has_motion(&self) -> bool {
        self.waypoints.len() > 1
    }

    pub fn is_time_ordered(&self) -> bool {
        self.waypoints
            .windows(2)
            .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms)
    }

    /// Operations this robot picks, in visiting order.
    pub fn picked_operations(&self) -> Vec<usize> {
        self.waypoints
            .iter()
            .filter(|w| w.kind == WaypointKind::Pick)
            .filter_map(|w| w.operation_id)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub tracks: Vec<RobotTrack>,
}

impl Schedule {
    pub fn new(tracks: Vec<RobotTrack>) -> Self {
        Self { tracks }
    }

    pub fn robot_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, robot: usize) -> Option<&RobotTrack> {
        self.tracks.get(robot)
    }

    pub fn makespan_ms(&self) -> u64 {
        self.tracks.iter().map(|t| t.finish_ms).max().unwrap_or(0)
    }

    /// Re-derives `operation -> robot` from the pick waypoints.
    pub fn assignment_map(&self) -> BTreeMap<usize, usize> {
        self.tracks
            .iter()
            .flat_map(|t| t.picked_operations().into_iter().map(move |op| (op, t.robot_id)))
            .collect()
    }

    pub fn waypoint_count(&self) -> usize {
        self.tracks.iter().map(|t| t.waypoints.len()).sum()
    }
}
