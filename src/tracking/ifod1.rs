//! First-order integration over fibre orientation distributions (iFOD1).
//!
//! Each step draws its direction from the FOD at the current position,
//! restricted to the curvature cone around the current direction, by
//! rejection sampling against an envelope estimated from a preliminary batch
//! of samples from the same cone.

use log::debug;
use rand::Rng;

use geometry::Frame;
use units::todo::Amplitudef32;

use super::method::{Method, State};
use crate::field::FieldSampler;
use crate::roi::Seed;
use crate::types::{Point, Vector};

/// Cone samples used to estimate the rejection sampling envelope
pub const ENVELOPE_SAMPLES: usize = 50;

/// The estimated envelope is inflated by this factor before use
pub const ENVELOPE_SCALE: f32 = 1.5;

/// Trial budget once the envelope estimate has already seen the threshold
/// exceeded: the FOD is known to be strong here, so keep trying.
pub const CONFIDENT_TRIALS: usize = 10_000;

pub struct Ifod1<'p, S> {
    state: State<'p, S>,
    /// Largest amplitude seen in the previous step's envelope estimate
    prev_max: Amplitudef32,
}

impl<'p, S: FieldSampler> Ifod1<'p, S> {
    pub fn new(state: State<'p, S>) -> Self { Self { state, prev_max: 0.0 } }
}

impl<S: FieldSampler> Method for Ifod1<'_, S> {

    fn initialise(&mut self, seed: &Seed) -> Option<Vector> {
        self.prev_max = 0.0;
        self.state.initialise(seed)
    }

    fn advance(&mut self) -> bool {
        let s = &mut self.state;
        let Some(dir) = s.dir else { return false };
        if !s.get_data() { return false }
        let threshold = s.params.threshold;
        let frame = Frame::around(&dir);

        let mut max_actual: Amplitudef32 = 0.0;
        for _ in 0..ENVELOPE_SAMPLES {
            let d = s.random_direction(&frame);
            let a = s.fod(&d);
            if a > max_actual { max_actual = a }
        }
        let max_val = self.prev_max.max(max_actual);
        self.prev_max = max_actual;

        if !max_val.is_finite() || max_val < threshold { return false }
        let envelope = max_val * ENVELOPE_SCALE;
        let trials = if max_actual > threshold { CONFIDENT_TRIALS } else { s.params.max_trials };

        for _ in 0..trials {
            let d = s.random_direction(&frame);
            let a = s.fod(&d);
            // NaN fails this comparison
            if a > threshold {
                if a > envelope {
                    debug!("iFOD1: amplitude {a} exceeds envelope {envelope} at {:?}", s.pos);
                }
                if a / envelope > s.rng.gen::<f32>() {
                    s.dir = Some(d);
                    s.pos += d * s.params.step_size;
                    return true
                }
            }
        }
        false
    }

    fn position (&self) -> Point          { self.state.pos }
    fn direction(&self) -> Option<Vector> { self.state.dir }

    fn restart(&mut self, position: Point, direction: Vector) {
        self.prev_max = 0.0;
        self.state.restart(position, direction);
    }
}
