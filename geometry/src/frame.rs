//! Orthonormal frames and random directions.

use rand::Rng;
use rand_distr::StandardNormal;
use units::todo::Anglef32;

use crate::Vector;

/// Right-handed orthonormal basis whose third axis `w` is a given direction.
#[derive(Clone, Copy, Debug)]
pub struct Frame {
    pub u: Vector,
    pub v: Vector,
    pub w: Vector,
}

impl Frame {

    /// Build a frame around the unit vector `w`.
    ///
    /// `u` is derived from whichever coordinate axis is least aligned with `w`,
    /// so the cross product never degenerates.
    pub fn around(w: &Vector) -> Self {
        let (ax, ay, az) = (w.x.abs(), w.y.abs(), w.z.abs());
        let least_aligned =
            if ax <= ay && ax <= az { Vector::x() }
            else if ay <= az        { Vector::y() }
            else                    { Vector::z() };
        let u = least_aligned.cross(w).normalize();
        let v = w.cross(&u);
        Self { u, v, w: *w }
    }

    /// Express local coordinates `(x, y, z)` in the frame's parent space
    #[inline]
    pub fn to_world(&self, x: f32, y: f32, z: f32) -> Vector {
        self.u * x + self.v * y + self.w * z
    }
}

/// Cone of directions around an axis, with half-angle of at most 90°.
#[derive(Clone, Copy, Debug)]
pub struct Cone {
    sin_half_angle: f32,
}

impl Cone {

    pub fn new(half_angle: Anglef32) -> Self {
        let half_angle = half_angle.clamp(0.0, std::f32::consts::FRAC_PI_2);
        Self { sin_half_angle: half_angle.sin() }
    }

    pub fn sin_half_angle(&self) -> f32 { self.sin_half_angle }

    /// Random unit vector within the cone around `frame.w`.
    ///
    /// A point is drawn uniformly from the unit disk by rejection, shrunk to
    /// the disk of radius `sin(half_angle)` and lifted onto the unit
    /// hemisphere above it.
    pub fn sample<R: Rng + ?Sized>(&self, frame: &Frame, rng: &mut R) -> Vector {
        let (x, y) = loop {
            let x = 2.0 * rng.gen::<f32>() - 1.0;
            let y = 2.0 * rng.gen::<f32>() - 1.0;
            if x*x + y*y <= 1.0 { break (x, y) }
        };
        let (x, y) = (x * self.sin_half_angle, y * self.sin_half_angle);
        let z = (1.0 - x*x - y*y).max(0.0).sqrt();
        frame.to_world(x, y, z)
    }
}

/// Isotropically distributed unit vector: three independent standard normal
/// components, normalized.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector {
    loop {
        let v = Vector::new(rng.sample(StandardNormal),
                            rng.sample(StandardNormal),
                            rng.sample(StandardNormal));
        let norm = v.norm();
        if norm > 1e-6 { return v / norm }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle_between;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;
    use rstest::rstest;

    fn assert_orthonormal(f: &Frame) {
        let tol = 1e-5;
        assert_float_eq!(f.u.norm(), 1.0, abs <= tol);
        assert_float_eq!(f.v.norm(), 1.0, abs <= tol);
        assert_float_eq!(f.w.norm(), 1.0, abs <= tol);
        assert_float_eq!(f.u.dot(&f.v), 0.0, abs <= tol);
        assert_float_eq!(f.v.dot(&f.w), 0.0, abs <= tol);
        assert_float_eq!(f.w.dot(&f.u), 0.0, abs <= tol);
        // Right-handed
        assert_float_eq!((f.u.cross(&f.v) - f.w).norm(), 0.0, abs <= tol);
    }

    #[rstest(/**/ w,
             case(Vector::x()),
             case(Vector::y()),
             case(Vector::z()),
             case(-Vector::z()),
             case(Vector::new(1.0, 1.0, 0.0).normalize()),
             case(Vector::new(-1.0, 2.0, -3.0).normalize()),
    )]
    fn frame_around_axis_is_orthonormal(w: Vector) {
        assert_orthonormal(&Frame::around(&w));
    }

    #[test]
    fn zero_angle_cone_returns_axis() {
        let mut rng = Isaac64Rng::seed_from_u64(1);
        let axis = Vector::new(0.3, -0.4, 0.5).normalize();
        let frame = Frame::around(&axis);
        let cone = Cone::new(0.0);
        for _ in 0..100 {
            let d = cone.sample(&frame, &mut rng);
            assert_float_eq!((d - axis).norm(), 0.0, abs <= 1e-6);
        }
    }

    #[test]
    fn cone_half_angle_saturates_at_right_angle() {
        assert_float_eq!(Cone::new(3.0).sin_half_angle(), 1.0, ulps <= 1);
        assert_float_eq!(Cone::new(-1.0).sin_half_angle(), 0.0, ulps <= 1);
    }

    #[test]
    fn random_unit_vectors_cover_both_hemispheres() {
        let mut rng = Isaac64Rng::seed_from_u64(7);
        let n = 10_000;
        let mut upper = 0;
        for _ in 0..n {
            let v = random_unit_vector(&mut rng);
            assert_float_eq!(v.norm(), 1.0, abs <= 1e-5);
            if v.z > 0.0 { upper += 1 }
        }
        // Isotropic: about half point upwards
        assert!((upper as f32 / n as f32 - 0.5).abs() < 0.03);
    }

    proptest! {
        #[test]
        fn frame_is_orthonormal_for_any_direction(
            x in -1.0..(1.0 as f32),
            y in -1.0..(1.0 as f32),
            z in -1.0..(1.0 as f32),
        ) {
            let w = Vector::new(x, y, z);
            prop_assume!(w.norm() > 1e-3);
            assert_orthonormal(&Frame::around(&w.normalize()));
        }

        #[test]
        fn cone_samples_stay_within_half_angle(
            half_angle in 0.0..(1.5 as f32),
            seed in 0..1000_u64,
        ) {
            let mut rng = Isaac64Rng::seed_from_u64(seed);
            let axis = random_unit_vector(&mut rng);
            let frame = Frame::around(&axis);
            let cone = Cone::new(half_angle);
            for _ in 0..20 {
                let d = cone.sample(&frame, &mut rng);
                assert_float_eq!(d.norm(), 1.0, abs <= 1e-5);
                assert!(angle_between(&d, &axis) <= half_angle + 1e-3);
            }
        }
    }
}
