//! Second-order integration over fibre orientation distributions (iFOD2).
//!
//! Candidate steps are circular arcs leaving the current position tangent to
//! the current direction. The probability of an arc is the product of the FOD
//! amplitudes, each along the local tangent, at several points spaced evenly
//! along it; candidates are then drawn by rejection sampling, as in iFOD1.

use log::debug;
use rand::Rng;

use geometry::{arc_samples, ArcSample, Frame};
use units::todo::Amplitudef32;

use super::ifod1::{CONFIDENT_TRIALS, ENVELOPE_SAMPLES, ENVELOPE_SCALE};
use super::method::{Method, State};
use crate::field::FieldSampler;
use crate::roi::Seed;
use crate::types::{Point, Vector};

pub struct Ifod2<'p, S> {
    state: State<'p, S>,
    prev_max: Amplitudef32,
    /// Per-sample threshold raised to the number of samples per arc
    threshold: Amplitudef32,
    arc: Vec<ArcSample>,
}

impl<'p, S: FieldSampler> Ifod2<'p, S> {

    pub fn new(state: State<'p, S>) -> Self {
        let n = state.params.num_samples;
        let threshold = state.params.threshold.powi(n as i32);
        Self { state, prev_max: 0.0, threshold, arc: Vec::with_capacity(n) }
    }

    /// Product of the amplitudes along the arc ending in direction `end_dir`,
    /// leaving the arc's samples in `self.arc`. Zero if any sample falls below
    /// the threshold, NaN if any sample lies outside the field.
    fn path_probability(&mut self, dir: &Vector, end_dir: &Vector) -> Amplitudef32 {
        let s = &mut self.state;
        arc_samples(&s.pos, dir, end_dir, s.params.step_size, s.params.num_samples, &mut self.arc);
        let mut probability = 1.0;
        for sample in &self.arc {
            if !s.get_data_at(&sample.position) { return f32::NAN }
            let a = s.fod(&sample.tangent);
            if !(a >= s.params.threshold) {
                return if a.is_nan() { f32::NAN } else { 0.0 }
            }
            probability *= a;
        }
        probability
    }
}

impl<S: FieldSampler> Method for Ifod2<'_, S> {

    fn initialise(&mut self, seed: &Seed) -> Option<Vector> {
        self.prev_max = 0.0;
        self.state.initialise(seed)
    }

    fn advance(&mut self) -> bool {
        let Some(dir) = self.state.dir else { return false };
        if !self.state.get_data() { return false }
        let frame = Frame::around(&dir);

        let mut max_actual: Amplitudef32 = 0.0;
        for _ in 0..ENVELOPE_SAMPLES {
            let end_dir = self.state.random_direction(&frame);
            let p = self.path_probability(&dir, &end_dir);
            if p > max_actual { max_actual = p }
        }
        let max_val = self.prev_max.max(max_actual);
        self.prev_max = max_actual;

        if !max_val.is_finite() || max_val < self.threshold { return false }
        let envelope = max_val * ENVELOPE_SCALE;
        let trials = if max_actual > self.threshold { CONFIDENT_TRIALS } else { self.state.params.max_trials };

        for _ in 0..trials {
            let end_dir = self.state.random_direction(&frame);
            let p = self.path_probability(&dir, &end_dir);
            if p > self.threshold {
                if p > envelope {
                    debug!("iFOD2: path probability {p} exceeds envelope {envelope} at {:?}", self.state.pos);
                }
                if p / envelope > self.state.rng.gen::<f32>() {
                    // Move to the end of the accepted arc
                    let Some(end) = self.arc.last() else { return false };
                    self.state.pos = end.position;
                    self.state.dir = Some(end.tangent);
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
