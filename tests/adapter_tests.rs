use armcell::adapters::outbound::scenario_data::{parse_scenario, FilesystemDataSource};
use armcell::adapters::outbound::schedule_writer::{render_schedule, write_json_report, write_schedule};
use armcell::domains::cell::{Point3, ScenarioDataSource};
use armcell::domains::scheduling::{RobotTrack, Schedule, Waypoint, WaypointKind};
use armcell::DomainError;
use std::fs;
use tempfile::tempdir;

const SCENARIO: &str = "\
# two arms, three jobs
2 3
-180 180 100 200
-180 180 100 200
-180 180 100 200
-180 180 100 200
-180 180 100 200
-180 180 100 200
0.05 0.2

0.6 0.0 0.2   0.6 0.3 0.2   100
0.0 0.6 0.2  -0.3 0.6 0.2   150.4
4.0 0.0 0.0   0.6 0.0 0.0   0
";

#[test]
fn test_parse_scenario_reads_all_sections() {
    let problem = parse_scenario(SCENARIO).unwrap();

    assert_eq!(problem.robot_count, 2);
    assert_eq!(problem.operation_count(), 3);
    assert_eq!(problem.joint_limits.len(), 6);
    assert_eq!(problem.joint_limits[3].max_velocity, 100.0);
    assert_eq!(problem.tool_clearance, 0.05);
    assert_eq!(problem.safe_distance, 0.2);
    assert_eq!(problem.operations[1].pick, Point3::new(0.0, 0.6, 0.2));
    assert_eq!(problem.operations[1].dwell_time_ms, 150);
    assert_eq!(problem.robot_base(1), Point3::ORIGIN);
}

#[test]
fn test_parse_scenario_accepts_robot_bases() {
    let text = format!("{}0 0 0\n2.5 0 0\n", SCENARIO);
    let problem = parse_scenario(&text).unwrap();
    assert_eq!(problem.robot_base(1), Point3::new(2.5, 0.0, 0.0));
}

#[test]
fn test_parse_errors_carry_line_numbers() {
    let bad_number = SCENARIO.replace("150.4", "soon");
    match parse_scenario(&bad_number) {
        Err(DomainError::Parse { line, reason }) => {
            assert_eq!(line, 12);
            assert!(reason.contains("soon"));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }

    let truncated: String = SCENARIO.lines().take(11).map(|l| format!("{}\n", l)).collect();
    assert!(matches!(parse_scenario(&truncated), Err(DomainError::Parse { line: 12, .. })));

    let negative_dwell = SCENARIO.replace("   100\n", "   -5\n");
    assert!(matches!(parse_scenario(&negative_dwell), Err(DomainError::Parse { line: 11, .. })));

    let stray = format!("{}1 2 3\n", SCENARIO);
    assert!(matches!(parse_scenario(&stray), Err(DomainError::Parse { line: 14, .. })));

    assert!(matches!(parse_scenario("-1 3\n"), Err(DomainError::Parse { line: 1, .. })));

    // oversized counts are rejected at the header, before anything is allocated
    let body: String = SCENARIO.lines().skip(2).map(|l| format!("{}\n", l)).collect();
    let huge_operations = format!("2 18446744073709551615\n{}", body);
    assert!(matches!(parse_scenario(&huge_operations), Err(DomainError::Parse { line: 1, .. })));

    let huge_robots = format!("18446744073709551615 0\n{}", body);
    assert!(matches!(parse_scenario(&huge_robots), Err(DomainError::Parse { line: 1, .. })));

    let short_of_operations = SCENARIO.replace("2 3\n", "2 40\n");
    match parse_scenario(&short_of_operations) {
        Err(DomainError::Parse { line, reason }) => {
            assert_eq!(line, 2);
            assert!(reason.contains("40"));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_structurally_invalid_scenario_is_rejected() {
    let text = SCENARIO.replace("-180 180 100 200\n-180 180 100 200\n0.05", "-180 180 100 200\n-180 180 0 200\n0.05");
    assert!(matches!(parse_scenario(&text), Err(DomainError::InvalidProblem { .. })));
}

#[test]
fn test_filesystem_datasource_loads_by_name_or_path() {
    let dir = tempdir().unwrap();
    let base = dir.path().to_path_buf();
    fs::write(base.join("cell.txt"), SCENARIO).unwrap();

    let ds = FilesystemDataSource::new(Some(base.clone()));
    let text = ds.load_scenario("cell.txt").unwrap();
    assert!(text.contains("two arms"));

    let full_path = base.join("cell.txt");
    let problem = ds.load_problem(full_path.to_str().unwrap()).unwrap();
    assert_eq!(problem.operation_count(), 3);

    assert!(matches!(
        ds.load_scenario("missing.txt"),
        Err(DomainError::InfrastructureError(_))
    ));
}

fn sample_schedule() -> Schedule {
    let mut track = RobotTrack::new(0, Point3::ORIGIN);
    track
        .waypoints
        .push(Waypoint::at(1200, Point3::new(0.6, 0.0, 0.2), WaypointKind::Pick, 0));
    track
        .waypoints
        .push(Waypoint::at(1900, Point3::new(0.6, 0.3, 0.2), WaypointKind::Place, 0));
    track.finish_ms = 2000;
    Schedule::new(vec![track, RobotTrack::new(1, Point3::new(1.0, 0.0, 0.0))])
}

#[test]
fn test_render_schedule_format() {
    let text = render_schedule(&sample_schedule());
    let expected = "\
2000
R0 3
0 0.000 0.000 0.000
1200 0.600 0.000 0.200
1900 0.600 0.300 0.200
R1 1
0 1.000 0.000 0.000
";
    assert_eq!(text, expected);
}

#[test]
fn test_write_schedule_and_report_files() {
    let dir = tempdir().unwrap();
    let schedule = sample_schedule();

    let schedule_path = dir.path().join("out.txt");
    write_schedule(&schedule_path, &schedule).unwrap();
    assert_eq!(fs::read_to_string(&schedule_path).unwrap(), render_schedule(&schedule));

    let report_path = dir.path().join("report.json");
    write_json_report(&report_path, &schedule).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["tracks"][0]["finish_ms"], 2000);
    assert_eq!(json["tracks"][0]["waypoints"][1]["kind"], "Pick");
}

#[test]
fn test_bundled_scenario_parses() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    let problem = FilesystemDataSource::new(Some(dir)).load_problem("two_arms.txt").unwrap();

    assert_eq!(problem.robot_count, 2);
    assert_eq!(problem.operation_count(), 4);
    assert_eq!(problem.robot_base(1), Point3::new(1.2, 0.0, 0.0));
    assert_eq!(problem.operations[0].pick, problem.operations[1].pick);
}
