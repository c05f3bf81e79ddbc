use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::common::{DomainError, DomainResult};
use crate::domains::scheduling::Schedule;

/// Renders the plain schedule format: makespan on the first line, then per
/// robot `R{id} {count}` followed by `{t} {x} {y} {z}` rows.
pub fn render_schedule(schedule: &Schedule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", schedule.makespan_ms());
    for track in &schedule.tracks {
        let _ = writeln!(out, "R{} {}", track.robot_id, track.waypoints.len());
        for w in &track.waypoints {
            let _ = writeln!(
                out,
                "{} {:.3} {:.3} {:.3}",
                w.timestamp_ms, w.position.x, w.position.y, w.position.z
            );
        }
    }
    out
}

pub fn write_schedule(path: &Path, schedule: &Schedule) -> DomainResult<()> {
    fs::write(path, render_schedule(schedule))
        .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))
}

pub fn render_json<T: Serialize>(value: &T) -> DomainResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn write_json_report<T: Serialize>(path: &Path, value: &T) -> DomainResult<()> {
    let json = render_json(value)?;
    fs::write(path, json).map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))
}
