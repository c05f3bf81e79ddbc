use armcell::domains::assignment::FeasibilityMatrix;
use armcell::domains::cell::{JointLimit, Operation, Point3, Problem, MAX_ROBOTS};
use armcell::domains::kinematics::{
    is_reachable, motion_profile, movement_time, operation_duration, try_reach, IkFailure, ProfileShape,
    ReachabilityMode, ReachabilityOracle, FOREARM_LENGTH, UPPER_ARM_LENGTH,
};

fn wide_limits() -> Vec<JointLimit> {
    vec![JointLimit::new(-180.0, 180.0, 100.0, 200.0); 6]
}

#[test]
fn test_point_beyond_arm_length_is_excluded_from_matrix() {
    let far = UPPER_ARM_LENGTH + FOREARM_LENGTH + 0.2;
    let problem = Problem::new(
        2,
        wide_limits(),
        0.05,
        0.2,
        vec![
            Operation::new(Point3::new(0.6, 0.0, 0.3), Point3::new(0.0, 0.6, 0.3), 100),
            Operation::new(Point3::new(far, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0), 100),
        ],
    );

    let mut oracle = ReachabilityOracle::new(&problem.joint_limits, ReachabilityMode::Strict);
    let matrix = FeasibilityMatrix::build(&problem, &mut oracle);

    assert_eq!(matrix.feasible_robots(0), vec![0, 1]);
    assert!(matrix.feasible_robots(1).is_empty());

    let excluded = matrix.unreachable_operations();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].operation_id, 1);
    assert!(excluded[0].pick_reachable_by.is_empty());
    assert_eq!(excluded[0].place_reachable_by, vec![0, 1]);
}

#[test]
fn test_inner_radius_and_min_reach_are_rejected() {
    let limits = wide_limits();
    let base = Point3::ORIGIN;

    assert!(matches!(
        try_reach(&Point3::new(0.05, 0.0, 0.0), &base, &limits),
        Err(IkFailure::TooClose { .. })
    ));
    assert!(matches!(
        try_reach(&Point3::new(0.2, 0.0, 0.0), &base, &limits),
        Err(IkFailure::InsideInnerRadius { .. })
    ));
    assert!(is_reachable(&Point3::new(0.0, 0.9, 0.2), &base, &limits));
}

#[test]
fn test_joint_limits_only_matter_in_strict_mode() {
    let mut limits = wide_limits();
    // base joint may only turn to the +x half plane
    limits[0] = JointLimit::new(-90.0, 90.0, 100.0, 200.0);
    let behind = Point3::new(-0.7, 0.0, 0.2);

    assert!(matches!(
        try_reach(&behind, &Point3::ORIGIN, &limits),
        Err(IkFailure::JointLimit { joint: 0, .. })
    ));

    let mut strict = ReachabilityOracle::new(&limits, ReachabilityMode::Strict);
    let mut permissive = ReachabilityOracle::new(&limits, ReachabilityMode::Permissive);
    assert!(!strict.reachable(0, &Point3::ORIGIN, &behind));
    assert!(permissive.reachable(0, &Point3::ORIGIN, &behind));
}

#[test]
fn test_oracle_respects_robot_base() {
    let limits = wide_limits();
    let mut oracle = ReachabilityOracle::new(&limits, ReachabilityMode::Strict);
    let point = Point3::new(3.6, 0.0, 0.2);

    assert!(!oracle.reachable(0, &Point3::ORIGIN, &point));
    assert!(oracle.reachable(1, &Point3::new(3.0, 0.0, 0.0), &point));

    // repeated queries are served from the cache
    oracle.reachable(1, &Point3::new(3.0, 0.0, 0.0), &point);
    assert_eq!(oracle.evaluations(), 2);
}

#[test]
fn test_movement_time_grows_with_distance() {
    let limits = wide_limits();
    let one = movement_time(&Point3::ORIGIN, &Point3::new(1.0, 0.0, 0.0), &limits);
    let two = movement_time(&Point3::ORIGIN, &Point3::new(2.0, 0.0, 0.0), &limits);

    assert!(one > 0);
    assert!(one < two);
    assert!(two < 5000);
    // 1.0 units/s cruise, 2.0 units/s^2: 1.5 s of motion plus 20%
    assert!((1799..=1800).contains(&one));
}

#[test]
fn test_movement_time_with_full_range_limits() {
    let limits = vec![JointLimit::new(-180.0, 180.0, 180.0, 360.0); 6];
    let one = movement_time(&Point3::ORIGIN, &Point3::new(1.0, 0.0, 0.0), &limits);
    let two = movement_time(&Point3::ORIGIN, &Point3::new(2.0, 0.0, 0.0), &limits);

    assert!(one > 0);
    assert!(one < 5000);
    assert!(one < two);
    // 1.8 units/s cruise, 3.6 units/s^2: 0.5 s ramps plus 0.1 units of cruise, plus 20%
    assert!((1266..=1267).contains(&one));
}

#[test]
fn test_short_moves_use_triangular_profile() {
    let limits = wide_limits();
    let short = motion_profile(&Point3::ORIGIN, &Point3::new(0.1, 0.0, 0.0), &limits);
    let long = motion_profile(&Point3::ORIGIN, &Point3::new(1.0, 0.0, 0.0), &limits);
    let none = motion_profile(&Point3::ORIGIN, &Point3::ORIGIN, &limits);

    assert_eq!(short.shape, ProfileShape::Triangular);
    assert!(short.peak_velocity < 1.0);
    assert_eq!(long.shape, ProfileShape::Trapezoidal);
    assert_eq!(none.shape, ProfileShape::Coincident);
    assert_eq!(none.duration_ms, 0);
}

#[test]
fn test_slowest_joint_sets_the_pace() {
    let fast = wide_limits();
    let mut slow = wide_limits();
    slow[4] = JointLimit::new(-180.0, 180.0, 20.0, 200.0);

    let to = Point3::new(1.0, 0.0, 0.0);
    assert!(movement_time(&Point3::ORIGIN, &to, &slow) > movement_time(&Point3::ORIGIN, &to, &fast));
}

#[test]
fn test_operation_duration_adds_dwell() {
    let limits = wide_limits();
    let op = Operation::new(Point3::new(0.5, 0.0, 0.0), Point3::new(0.5, 0.5, 0.0), 250);
    let travel = movement_time(&op.pick, &op.place, &limits);

    assert_eq!(operation_duration(&op, &limits), travel + 250);
}

#[test]
fn test_problem_bases_default_to_origin_and_robot_count_is_bounded() {
    let problem = Problem::new(3, wide_limits(), 0.05, 0.2, Vec::new());
    assert!(problem.robot_bases.is_empty());
    assert_eq!(problem.robot_base(2), Point3::ORIGIN);
    assert!(problem.validate().is_ok());

    let crowded = Problem::new(MAX_ROBOTS + 1, wide_limits(), 0.05, 0.2, Vec::new());
    assert!(crowded.validate().is_err());
}
