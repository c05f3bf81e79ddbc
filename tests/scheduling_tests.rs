use std::collections::BTreeMap;

use armcell::domains::assignment::Assignment;
use armcell::domains::cell::{JointLimit, Operation, Point3, Problem};
use armcell::domains::kinematics::movement_time;
use armcell::domains::scheduling::{PathBuilder, PathBuilderOptions, WaypointKind};

fn wide_limits() -> Vec<JointLimit> {
    vec![JointLimit::new(-180.0, 180.0, 100.0, 200.0); 6]
}

/// Two arms facing each other across a shared pickup at (0.5, 0, 0.3).
fn shared_pickup_problem() -> Problem {
    let pick = Point3::new(0.5, 0.0, 0.3);
    Problem::new(
        2,
        wide_limits(),
        0.05,
        0.2,
        vec![
            Operation::new(pick, Point3::new(0.5, 0.5, 0.3), 100),
            Operation::new(pick, Point3::new(0.5, -0.5, 0.3), 100),
        ],
    )
    .with_robot_bases(vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)])
}

fn pick_time(schedule: &armcell::domains::scheduling::Schedule, robot: usize) -> u64 {
    schedule
        .track(robot)
        .and_then(|t| t.waypoints.iter().find(|w| w.kind == WaypointKind::Pick))
        .map(|w| w.timestamp_ms)
        .unwrap()
}

#[test]
fn test_tracks_start_at_base_and_stay_time_ordered() {
    let problem = Problem::new(
        2,
        wide_limits(),
        0.05,
        0.2,
        vec![
            Operation::new(Point3::new(0.6, 0.0, 0.2), Point3::new(0.0, 0.6, 0.2), 50),
            Operation::new(Point3::new(0.7, 0.1, 0.2), Point3::new(0.1, 0.7, 0.2), 75),
            Operation::new(Point3::new(-0.6, 0.0, 0.2), Point3::new(0.0, -0.6, 0.2), 0),
        ],
    );
    let assignment = Assignment::from_robots(vec![Some(0), Some(0), Some(1)]);
    let schedule = PathBuilder::new(&problem, PathBuilderOptions::default()).build(&assignment);

    assert_eq!(schedule.robot_count(), 2);
    for track in &schedule.tracks {
        let first = &track.waypoints[0];
        assert_eq!(first.kind, WaypointKind::Base);
        assert_eq!(first.timestamp_ms, 0);
        assert_eq!(first.position, problem.robot_base(track.robot_id));
        assert!(track.is_time_ordered());
        assert!(track.finish_ms >= track.waypoints.last().unwrap().timestamp_ms);
    }
    assert_eq!(schedule.track(0).unwrap().picked_operations(), vec![0, 1]);
}

#[test]
fn test_schedule_reproduces_assignment() {
    let problem = shared_pickup_problem();
    let assignment = Assignment::from_robots(vec![Some(1), Some(0)]);
    let schedule = PathBuilder::new(&problem, PathBuilderOptions::default()).build(&assignment);

    let expected: BTreeMap<usize, usize> = assignment.iter().collect();
    assert_eq!(schedule.assignment_map(), expected);
}

#[test]
fn test_shared_pickup_is_never_occupied_twice() {
    let problem = shared_pickup_problem();
    let assignment = Assignment::from_robots(vec![Some(0), Some(1)]);
    let builder = PathBuilder::new(&problem, PathBuilderOptions::default());
    assert!(builder.reservation_table(&assignment).is_contended(&Point3::new(0.5, 0.0, 0.3)));

    let schedule = builder.build(&assignment);
    let first = pick_time(&schedule, 0);
    let second = pick_time(&schedule, 1);
    assert!(second >= first + 100, "second pick at {} overlaps first at {}", second, first);

    // robot 1 arrives as early as robot 0 and has to wait at its base
    let hold = schedule.track(1).unwrap().waypoints.iter().find(|w| w.kind == WaypointKind::Hold);
    assert_eq!(hold.map(|w| w.position), Some(Point3::new(1.0, 0.0, 0.0)));
    assert!(schedule.track(1).unwrap().is_time_ordered());
}

#[test]
fn test_same_robot_reuses_pickup_without_holding() {
    let problem = shared_pickup_problem();
    let assignment = Assignment::from_robots(vec![Some(0), Some(0)]);
    let schedule = PathBuilder::new(&problem, PathBuilderOptions::default()).build(&assignment);

    let track = schedule.track(0).unwrap();
    assert!(track.waypoints.iter().all(|w| w.kind != WaypointKind::Hold));
    assert!(!schedule.track(1).unwrap().has_motion());
}

#[test]
fn test_via_point_offset_alternates_by_robot() {
    let problem = shared_pickup_problem();
    let assignment = Assignment::from_robots(vec![Some(0), Some(1)]);
    let schedule = PathBuilder::new(&problem, PathBuilderOptions::default()).build(&assignment);

    let via_z = |robot: usize| {
        schedule
            .track(robot)
            .and_then(|t| t.waypoints.iter().find(|w| w.kind == WaypointKind::Via))
            .map(|w| w.position.z)
            .unwrap()
    };
    // 60% of the way up to z = 0.3, then +/- 0.05
    assert!((via_z(0) - 0.23).abs() < 1e-9);
    assert!((via_z(1) - 0.13).abs() < 1e-9);
}

#[test]
fn test_without_via_points_timing_is_direct() {
    let problem = shared_pickup_problem();
    let options = PathBuilderOptions {
        via_points: false,
        ..PathBuilderOptions::default()
    };
    let assignment = Assignment::from_robots(vec![Some(0), None]);
    let schedule = PathBuilder::new(&problem, options).build(&assignment);

    let op = &problem.operations[0];
    let travel = movement_time(&Point3::ORIGIN, &op.pick, &problem.joint_limits);
    let place = movement_time(&op.pick, &op.place, &problem.joint_limits);
    let track = schedule.track(0).unwrap();

    assert_eq!(track.waypoints.len(), 3);
    assert_eq!(track.waypoints[1].timestamp_ms, travel);
    assert_eq!(track.waypoints[2].timestamp_ms, travel + 100 + place);
    assert_eq!(track.finish_ms, travel + 100 + place + 100);
    assert_eq!(schedule.makespan_ms(), track.finish_ms);
}
