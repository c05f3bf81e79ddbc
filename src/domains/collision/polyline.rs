use serde::{Deserialize, Serialize};

use super::segment::segment_distance;
use crate::domains::cell::Point3;

/// First segment pair of two polylines found closer than the safe distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentViolation {
    pub segment_a: usize,
    pub segment_b: usize,
    pub distance: f64,
}

/// Consecutive point pairs of a polyline. A single point is a degenerate
/// segment so a parked arm still occupies space.
pub fn segments(path: &[Point3]) -> Vec<(Point3, Point3)> {
    match path.len() {
        0 => Vec::new(),
        1 => vec![(path[0], path[0])],
        _ => path.windows(2).map(|w| (w[0], w[1])).collect(),
    }
}

/// Exhaustive scan over every segment pair; stops at the first pair closer
/// than `safe_distance`.
pub fn first_violation(path1: &[Point3], path2: &[Point3], safe_distance: f64) -> Option<SegmentViolation> {
    let segs2 = segments(path2);
    for (i, (a1, a2)) in segments(path1).iter().enumerate() {
        for (j, (b1, b2)) in segs2.iter().enumerate() {
            let distance = segment_distance(a1, a2, b1, b2);
            if distance < safe_distance {
                return Some(SegmentViolation {
                    segment_a: i,
                    segment_b: j,
                    distance,
                });
            }
        }
    }
    None
}

pub fn path_collides(path1: &[Point3], path2: &[Point3], safe_distance: f64) -> bool {
    first_violation(path1, path2, safe_distance).is_some()
}

/// Smallest distance between any two segments, `None` if a path is empty.
pub fn closest_approach(path1: &[Point3], path2: &[Point3]) -> Option<f64> {
    let segs2 = segments(path2);
    segments(path1)
        .iter()
        .flat_map(|(a1, a2)| segs2.iter().map(move |(b1, b2)| segment_distance(a1, a2, b1, b2)))
        .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.min(d))))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: Point3,
    max: Point3,
}

impl Bounds {
    fn of(path: &[Point3]) -> Option<Bounds> {
        let first = *path.first()?;
        Some(path.iter().fold(Bounds { min: first, max: first }, |b, p| Bounds {
            min: Point3::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z)),
            max: Point3::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z)),
        }))
    }

    fn gap(&self, other: &Bounds) -> f64 {
        let axis = |lo1: f64, hi1: f64, lo2: f64, hi2: f64| (lo2 - hi1).max(lo1 - hi2).max(0.0);
        Point3::new(
            axis(self.min.x, self.max.x, other.min.x, other.max.x),
            axis(self.min.y, self.max.y, other.min.y, other.max.y),
            axis(self.min.z, self.max.z, other.min.z, other.max.z),
        )
        .norm()
    }
}

/// Heuristic accelerator in front of [`path_collides`].
///
/// Two cheap passes run first: a bounding-box reject, which is exact because
/// no segment can leave its polyline's box, and a strided scan over every
/// `stride`-th segment pair that can only report a collision early. When
/// neither decides, the exhaustive check runs, so the answer is always the
/// exhaustive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceleratedPathCheck {
    pub stride: usize,
}

impl AcceleratedPathCheck {
    pub fn new(stride: usize) -> Self {
        Self { stride: stride.max(1) }
    }

    pub fn collides(&self, path1: &[Point3], path2: &[Point3], safe_distance: f64) -> bool {
        match (Bounds::of(path1), Bounds::of(path2)) {
            (Some(b1), Some(b2)) => {
                let finite = path1.iter().chain(path2).all(Point3::is_finite);
                if finite && b1.gap(&b2) >= safe_distance {
                    return false;
                }
            }
            _ => return false,
        }

        if self.stride > 1 {
            let segs1 = segments(path1);
            let segs2 = segments(path2);
            for (a1, a2) in segs1.iter().step_by(self.stride) {
                for (b1, b2) in segs2.iter().step_by(self.stride) {
                    if segment_distance(a1, a2, b1, b2) < safe_distance {
                        return true;
                    }
                }
            }
        }

        path_collides(path1, path2, safe_distance)
    }
}
