use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::reservation::PickupReservationTable;
use super::schedule::{RobotTrack, Schedule, Waypoint, WaypointKind};
use crate::domains::assignment::Assignment;
use crate::domains::cell::{Point3, Problem};
use crate::domains::kinematics::{movement_time, COINCIDENT_EPSILON};

pub const VIA_FRACTION: f64 = 0.6;
pub const VIA_OFFSET: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathBuilderOptions {
    pub via_points: bool,
    /// Fraction of the approach at which the via waypoint sits.
    pub via_fraction: f64,
    /// Vertical offset of the via waypoint; sign alternates by robot index.
    pub via_offset: f64,
}

impl Default for PathBuilderOptions {
    fn default() -> Self {
        Self {
            via_points: true,
            via_fraction: VIA_FRACTION,
            via_offset: VIA_OFFSET,
        }
    }
}

/// Turns an assignment into timed waypoints per robot.
///
/// Robots are built in index order and each robot visits its operations in
/// ascending id order, so a shared pickup is granted to whichever operation
/// is processed first.
pub struct PathBuilder<'a> {
    problem: &'a Problem,
    options: PathBuilderOptions,
}

impl<'a> PathBuilder<'a> {
    pub fn new(problem: &'a Problem, options: PathBuilderOptions) -> Self {
        Self { problem, options }
    }

    /// +1 for even robots, -1 for odd ones.
    pub fn via_sign(robot: usize) -> f64 {
        if robot % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn build(&self, assignment: &Assignment) -> Schedule {
        let mut table = self.reservation_table(assignment);
        let tracks = (0..self.problem.robot_count)
            .map(|robot| self.build_track(robot, &assignment.operations_for(robot), &mut table))
            .collect();
        Schedule::new(tracks)
    }

    /// Registers every pick coordinate used by more than one assigned operation.
    pub fn reservation_table(&self, assignment: &Assignment) -> PickupReservationTable {
        let mut uses: HashMap<_, (Point3, usize)> = HashMap::new();
        for (op_id, _) in assignment.iter() {
            if let Some(op) = self.problem.operations.get(op_id) {
                uses.entry(op.pick.key()).or_insert((op.pick, 0)).1 += 1;
            }
        }

        let mut table = PickupReservationTable::new();
        for (point, count) in uses.values() {
            if *count > 1 {
                table.track(point);
            }
        }
        table
    }

    fn via_point(&self, robot: usize, from: &Point3, pick: &Point3) -> Option<Point3> {
        if !self.options.via_points || from.distance(pick) < COINCIDENT_EPSILON {
            return None;
        }
        let lift = Point3::new(0.0, 0.0, Self::via_sign(robot) * self.options.via_offset);
        Some(from.lerp(pick, self.options.via_fraction).add(&lift))
    }

    fn build_track(&self, robot: usize, ops: &[usize], table: &mut PickupReservationTable) -> RobotTrack {
        let limits = &self.problem.joint_limits;
        let base = self.problem.robot_base(robot);
        let mut track = RobotTrack::new(robot, base);
        let mut clock = 0u64;
        let mut position = base;

        for &op_id in ops {
            let Some(op) = self.problem.operations.get(op_id) else {
                continue;
            };

            let via = self.via_point(robot, &position, &op.pick);
            let travel = match &via {
                Some(v) => movement_time(&position, v, limits).saturating_add(movement_time(v, &op.pick, limits)),
                None => movement_time(&position, &op.pick, limits),
            };
            let arrival = clock.saturating_add(travel);
            let granted = table.acquire(&op.pick, arrival, op.dwell_time_ms, robot, op_id);

            if granted.start_ms > arrival {
                clock += granted.start_ms - arrival;
                track
                    .waypoints
                    .push(Waypoint::at(clock, position, WaypointKind::Hold, op_id));
            }
            if let Some(v) = via {
                let at = clock.saturating_add(movement_time(&position, &v, limits));
                track.waypoints.push(Waypoint::at(at, v, WaypointKind::Via, op_id));
            }

            clock = granted.start_ms;
            track
                .waypoints
                .push(Waypoint::at(clock, op.pick, WaypointKind::Pick, op_id));
            clock = clock.saturating_add(op.dwell_time_ms);

            clock = clock.saturating_add(movement_time(&op.pick, &op.place, limits));
            track
                .waypoints
                .push(Waypoint::at(clock, op.place, WaypointKind::Place, op_id));
            clock = clock.saturating_add(op.dwell_time_ms);

            position = op.place;
        }

        track.finish_ms = clock;
        track
    }
}
