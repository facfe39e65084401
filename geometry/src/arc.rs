//! Circular arcs of fixed length between two headings.

use units::todo::Lengthf32;
use crate::{clamped_cos, Point, Vector};

/// Below this turning angle (radians) an arc is treated as a straight segment
const STRAIGHT: f32 = 1e-6;

/// Position and unit tangent at one point along an arc
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSample {
    pub position: Point,
    pub tangent: Vector,
}

/// Fill `out` with `n` equally spaced samples along the circular arc of length
/// `length` which leaves `start` heading along `dir` and finishes heading along
/// `end_dir`. The first sample is one `n`th of the way along the arc; the last
/// is its end point, whose tangent is exactly `end_dir`.
///
/// For a turning angle θ the arc radius is `length / θ`. Both directions must
/// be unit vectors.
pub fn arc_samples(
    start  : &Point,
    dir    : &Vector,
    end_dir: &Vector,
    length : Lengthf32,
    n      : usize,
    out    : &mut Vec<ArcSample>,
) {
    out.clear();
    let cos_theta = clamped_cos(dir, end_dir);
    let theta = cos_theta.acos();
    let curv = end_dir - dir * cos_theta;
    let curv_norm = curv.norm();

    if theta < STRAIGHT || curv_norm < STRAIGHT {
        for i in 1..=n {
            let f = length * i as f32 / n as f32;
            out.push(ArcSample { position: start + dir * f, tangent: *dir });
        }
        return;
    }

    // Unit vector in the plane of the arc, perpendicular to `dir`
    let curv = curv / curv_norm;
    let radius = length / theta;
    for i in 1..=n {
        let a = theta * i as f32 / n as f32;
        let (sin_a, cos_a) = a.sin_cos();
        let position = start + (dir * sin_a + curv * (1.0 - cos_a)) * radius;
        let tangent = if i == n { *end_dir } else { dir * cos_a + curv * sin_a };
        out.push(ArcSample { position, tangent });
    }
}
