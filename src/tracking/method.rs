//! What every propagation method has in common.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use geometry::{random_unit_vector, Cone, Frame};
use units::todo::Amplitudef32;

use super::params::Parameters;
use crate::field::FieldSampler;
use crate::roi::Seed;
use crate::sh::Amplitude;
use crate::types::{Point, Vector};

/// A way of extending a streamline one step at a time.
///
/// Failure to initialise or to advance is the normal end of a streamline, not
/// an error.
pub trait Method {

    /// Place the method at `seed` and choose an initial direction. `None` if
    /// the field cannot be sampled there or no direction is strong enough.
    fn initialise(&mut self, seed: &Seed) -> Option<Vector>;

    /// Take one step. On success `position` and `direction` describe the new
    /// end of the streamline.
    fn advance(&mut self) -> bool;

    fn position(&self) -> Point;

    fn direction(&self) -> Option<Vector>;

    /// Resume at `position` heading along `direction`, forgetting anything
    /// learned on the way so far. Used to track back from the seed.
    fn restart(&mut self, position: Point, direction: Vector);
}

/// Per-thread state shared by all methods: current position and direction,
/// the field sampler and amplitude evaluator, the coefficient buffer and the
/// random number generator.
pub struct State<'p, S> {
    pub params: &'p Parameters,
    pub sampler: S,
    pub amplitude: Amplitude,
    pub rng: Isaac64Rng,
    pub pos: Point,
    pub dir: Option<Vector>,
    pub values: Vec<f32>,
    pub cone: Cone,
}

impl<'p, S: FieldSampler> State<'p, S> {

    pub fn new(params: &'p Parameters, sampler: S, amplitude: Amplitude, seed: u64) -> Self {
        let values = vec![0.0; sampler.n_values()];
        Self {
            params,
            sampler,
            amplitude,
            rng: Isaac64Rng::seed_from_u64(seed),
            pos: Point::origin(),
            dir: None,
            values,
            cone: Cone::new(params.max_angle),
        }
    }

    /// Sample the field at the current position
    pub fn get_data(&mut self) -> bool {
        self.sampler.sample(&self.pos, &mut self.values)
    }

    /// Sample the field at `p`, without moving
    pub fn get_data_at(&mut self, p: &Point) -> bool {
        self.sampler.sample(p, &mut self.values)
    }

    /// FOD amplitude along `d`, from the most recently sampled coefficients
    pub fn fod(&mut self, d: &Vector) -> Amplitudef32 {
        self.amplitude.value(&self.values, d)
    }

    /// Random direction within the curvature cone around `frame.w`
    pub fn random_direction(&mut self, frame: &Frame) -> Vector {
        self.cone.sample(frame, &mut self.rng)
    }

    /// Move to `seed` and pick a starting direction: the seed's or the
    /// configured one if available, otherwise the first of up to `max_trials`
    /// isotropic random directions whose amplitude beats the initiation
    /// threshold.
    pub fn initialise(&mut self, seed: &Seed) -> Option<Vector> {
        self.pos = seed.position;
        self.dir = None;
        if !self.get_data() { return None }
        let threshold = self.params.init_threshold;
        let dir = match seed.direction.or(self.params.init_dir) {
            Some(d) => {
                let a = self.fod(&d);
                (a.is_finite() && a > threshold).then_some(d)
            }
            None => {
                let mut found = None;
                for _ in 0..self.params.max_trials {
                    let d = random_unit_vector(&mut self.rng);
                    if self.fod(&d) > threshold { found = Some(d); break }
                }
                found
            }
        }?;
        self.dir = Some(dir);
        Some(dir)
    }

    pub fn restart(&mut self, position: Point, direction: Vector) {
        self.pos = position;
        self.dir = Some(direction);
    }
}

/// Hands out distinct RNG seeds to the threads of a run.
///
/// The base is either fixed, for reproducible runs, or taken from the clock.
#[derive(Debug)]
pub struct SeedSource {
    base: u64,
    counter: AtomicU64,
}

impl SeedSource {

    pub fn fixed(base: u64) -> Self { Self { base, counter: AtomicU64::new(0) } }

    pub fn from_clock() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::fixed(now.as_secs() ^ (now.subsec_nanos() as u64).rotate_left(32))
    }

    pub fn next(&self) -> u64 {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        // Golden-ratio Weyl sequence
        self.base ^ n.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

#[cfg(test)]
pub(crate) mod test_fields {
    //! Analytic fields for exercising the methods without image files

    use super::*;

    /// The same coefficients everywhere within `radius` of the origin
    pub struct Uniform {
        pub coefficients: Vec<f32>,
        pub radius: f32,
    }

    impl FieldSampler for Uniform {
        fn n_values(&self) -> usize { self.coefficients.len() }
        fn sample(&mut self, position: &Point, values: &mut [f32]) -> bool {
            if position.coords.norm() > self.radius { return false }
            values.copy_from_slice(&self.coefficients);
            true
        }
    }

    /// Isotropic FOD of the given amplitude: only the l = 0 coefficient
    pub fn isotropic(amplitude: f32, radius: f32) -> Uniform {
        Uniform { coefficients: vec![amplitude * (4.0 * std::f32::consts::PI).sqrt()], radius }
    }

    /// Single fibre along z on an isotropic background: peaks at 4.2, never
    /// below 0.14, so every direction clears the default cutoff
    pub fn fibre_along_z() -> Uniform {
        let mut coefficients = crate::sh::delta(&Vector::z(), 8);
        coefficients[0] += 0.65 * (4.0 * std::f32::consts::PI).sqrt();
        Uniform { coefficients, radius: 1000.0 }
    }

    /// Unit vector 30° from z, in the xz plane
    pub fn tilted() -> Vector { Vector::new(0.5, 0.0, 0.75_f32.sqrt()) }

    /// Within 25° of z
    pub fn near_fibre(d: &Vector) -> bool {
        geometry::angle_between(d, &Vector::z()) < 25_f32.to_radians()
    }
}
