use crate::domains::cell::Point3;

/// Below this the segments are treated as parallel and numerators snap to zero.
pub const PARALLEL_EPSILON: f64 = 1e-9;

/// Minimum Euclidean distance between the finite segments `[p1, p2]` and
/// `[q1, q2]`.
///
/// Closest-point parameters are clamped in a fixed order: `s` on the first
/// segment first, then `t` on the second, re-deriving the other parameter each
/// time. A non-finite result is reported as `0.0`, i.e. already in violation.
pub fn segment_distance(p1: &Point3, p2: &Point3, q1: &Point3, q2: &Point3) -> f64 {
    let u = p2.sub(p1);
    let v = q2.sub(q1);
    let w0 = p1.sub(q1);

    let a = u.dot(&u);
    let b = u.dot(&v);
    let c = v.dot(&v);
    let d = u.dot(&w0);
    let e = v.dot(&w0);
    let denom = a * c - b * b;

    let (mut s_num, mut s_den) = (denom, denom);
    let (mut t_num, mut t_den) = (denom, denom);

    if c < PARALLEL_EPSILON {
        // second segment is a point: project it onto the first
        s_num = -d;
        s_den = if a < PARALLEL_EPSILON { 1.0 } else { a };
        t_num = 0.0;
        t_den = 1.0;
        if s_num < 0.0 {
            s_num = 0.0;
        } else if s_num > s_den {
            s_num = s_den;
        }
    } else if denom < PARALLEL_EPSILON {
        s_num = 0.0;
        s_den = 1.0;
        t_num = e;
        t_den = c;
    } else {
        s_num = b * e - c * d;
        t_num = a * e - b * d;
        if s_num < 0.0 {
            s_num = 0.0;
            t_num = e;
            t_den = c;
        } else if s_num > s_den {
            s_num = s_den;
            t_num = e + b;
            t_den = c;
        }
    }

    if t_num < 0.0 {
        t_num = 0.0;
        if -d < 0.0 {
            s_num = 0.0;
        } else if -d > a {
            s_num = s_den;
        } else {
            s_num = -d;
            s_den = a;
        }
    } else if t_num > t_den {
        t_num = t_den;
        if -d + b < 0.0 {
            s_num = 0.0;
        } else if -d + b > a {
            s_num = s_den;
        } else {
            s_num = -d + b;
            s_den = a;
        }
    }

    let s = if s_num.abs() < PARALLEL_EPSILON { 0.0 } else { s_num / s_den };
    let t = if t_num.abs() < PARALLEL_EPSILON { 0.0 } else { t_num / t_den };

    let closest = w0.add(&u.scale(s)).sub(&v.scale(t));
    let distance = closest.norm();
    if distance.is_finite() {
        distance
    } else {
        0.0
    }
}
