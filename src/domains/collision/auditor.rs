//! Pairwise safety audit of built schedules.
//!
//! `Spatial` compares whole polylines and ignores time, so arms that pass the
//! same spot minutes apart are still flagged. `Temporal` only compares segment
//! pairs whose time windows overlap; a finished arm is treated as parked at
//! its last waypoint for the rest of the run.

use serde::{Deserialize, Serialize};

use super::polyline::{closest_approach, first_violation, AcceleratedPathCheck, SegmentViolation};
use super::segment::segment_distance;
use crate::domains::cell::Point3;
use crate::domains::scheduling::{RobotTrack, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditMode {
    #[default]
    Spatial,
    Temporal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEntry {
    pub robot_a: usize,
    pub robot_b: usize,
    pub min_distance: f64,
    pub first_violation: SegmentViolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub mode: AuditMode,
    pub safe_distance: f64,
    pub pairs_checked: usize,
    pub entries: Vec<CollisionEntry>,
}

impl CollisionReport {
    pub fn is_clear(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_pair(&self, a: usize, b: usize) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.entries.iter().any(|e| e.robot_a == lo && e.robot_b == hi)
    }

    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.entries.iter().map(|e| (e.robot_a, e.robot_b)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimedSegment {
    from: Point3,
    to: Point3,
    start_ms: u64,
    end_ms: u64,
}

fn timed_segments(track: &RobotTrack) -> Vec<TimedSegment> {
    let mut out: Vec<TimedSegment> = track
        .waypoints
        .windows(2)
        .map(|w| TimedSegment {
            from: w[0].position,
            to: w[1].position,
            start_ms: w[0].timestamp_ms,
            end_ms: w[1].timestamp_ms,
        })
        .collect();
    if let Some(last) = track.waypoints.last() {
        out.push(TimedSegment {
            from: last.position,
            to: last.position,
            start_ms: last.timestamp_ms,
            end_ms: u64::MAX,
        });
    }
    out
}

fn temporal_scan(a: &RobotTrack, b: &RobotTrack, safe_distance: f64) -> (Option<SegmentViolation>, f64) {
    let segs_b = timed_segments(b);
    let mut first = None;
    let mut min_distance = f64::INFINITY;
    for (i, sa) in timed_segments(a).iter().enumerate() {
        for (j, sb) in segs_b.iter().enumerate() {
            if sa.start_ms > sb.end_ms || sb.start_ms > sa.end_ms {
                continue;
            }
            let distance = segment_distance(&sa.from, &sa.to, &sb.from, &sb.to);
            min_distance = min_distance.min(distance);
            if first.is_none() && distance < safe_distance {
                first = Some(SegmentViolation {
                    segment_a: i,
                    segment_b: j,
                    distance,
                });
            }
        }
    }
    (first, min_distance)
}

#[derive(Debug, Clone, Default)]
pub struct CollisionAuditor {
    mode: AuditMode,
    accelerator: Option<AcceleratedPathCheck>,
}

impl CollisionAuditor {
    pub fn new(mode: AuditMode) -> Self {
        Self {
            mode,
            accelerator: None,
        }
    }

    /// Puts the bounding-box / strided pre-pass in front of the spatial check.
    pub fn with_accelerator(mut self, accelerator: AcceleratedPathCheck) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    pub fn mode(&self) -> AuditMode {
        self.mode
    }

    pub fn audit(&self, schedule: &Schedule, safe_distance: f64) -> CollisionReport {
        let active: Vec<&RobotTrack> = schedule.tracks.iter().filter(|t| t.has_motion()).collect();
        let mut entries = Vec::new();
        let mut pairs_checked = 0;

        for (i, a) in active.iter().enumerate() {
            for b in active.iter().skip(i + 1) {
                pairs_checked += 1;
                if let Some(entry) = self.check_pair(a, b, safe_distance) {
                    entries.push(entry);
                }
            }
        }

        CollisionReport {
            mode: self.mode,
            safe_distance,
            pairs_checked,
            entries,
        }
    }

    fn check_pair(&self, a: &RobotTrack, b: &RobotTrack, safe_distance: f64) -> Option<CollisionEntry> {
        let (first, min_distance) = match self.mode {
            AuditMode::Spatial => {
                let path_a = a.polyline();
                let path_b = b.polyline();
                if let Some(acc) = &self.accelerator {
                    if !acc.collides(&path_a, &path_b, safe_distance) {
                        return None;
                    }
                }
                let first = first_violation(&path_a, &path_b, safe_distance);
                let min_distance = closest_approach(&path_a, &path_b).unwrap_or(f64::INFINITY);
                (first, min_distance)
            }
            AuditMode::Temporal => temporal_scan(a, b, safe_distance),
        };

        first.map(|first_violation| CollisionEntry {
            robot_a: a.robot_id.min(b.robot_id),
            robot_b: a.robot_id.max(b.robot_id),
            min_distance,
            first_violation,
        })
    }
}
