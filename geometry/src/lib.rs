mod frame;
mod arc;
mod sphere;

pub use frame::{Frame, Cone, random_unit_vector};
pub use arc::{ArcSample, arc_samples};
pub use sphere::Sphere;

pub type Point  = nalgebra::Point3 <f32>;
pub type Vector = nalgebra::Vector3<f32>;

/// Cosine of the angle between two unit vectors, clamped to the domain of
/// `acos`.
///
/// Rounding can push the dot product of two unit vectors slightly outside
/// `[-1, 1]`, which would make `acos` return NaN.
#[inline]
pub fn clamped_cos(a: &Vector, b: &Vector) -> f32 {
    a.dot(b).clamp(-1.0, 1.0)
}

/// Angle in radians between two unit vectors
#[inline]
pub fn angle_between(a: &Vector, b: &Vector) -> f32 {
    clamped_cos(a, b).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn parallel_vectors_do_not_produce_nan() {
        // Normalization leaves this a hair longer than 1
        let a = Vector::new(1.0, 1.0, 1.0).normalize();
        assert!(angle_between(&a, &a).is_finite());
        assert_float_eq!(angle_between(&a, &a), 0.0, abs <= 1e-3);
        assert_float_eq!(angle_between(&a, &-a), std::f32::consts::PI, abs <= 1e-3);
    }
}
