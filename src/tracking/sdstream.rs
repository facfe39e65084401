//! Deterministic tracking along FOD peaks (SD_STREAM).
//!
//! Each step follows the local maximum of the FOD nearest to the current
//! direction, found by hill-climbing on the sphere.

use geometry::{angle_between, Frame};
use units::todo::{Amplitudef32, Anglef32};

use super::method::{Method, State};
use crate::field::FieldSampler;
use crate::roi::Seed;
use crate::types::{Point, Vector};

/// Initial angular step of the peak search
const SEARCH_START: Anglef32 = 0.1;
/// The search ends once its angular step drops below this
const SEARCH_PRECISION: Anglef32 = 1e-4;
const SEARCH_MAX_ITERATIONS: usize = 200;

pub struct SdStream<'p, S> {
    state: State<'p, S>,
}

impl<'p, S: FieldSampler> SdStream<'p, S> {

    pub fn new(state: State<'p, S>) -> Self { Self { state } }

    /// Hill-climb from `start` towards the nearest FOD maximum, using the most
    /// recently sampled coefficients. Returns the peak direction and its
    /// amplitude.
    fn find_peak(&mut self, start: Vector) -> (Vector, Amplitudef32) {
        let s = &mut self.state;
        let mut best_dir = start;
        let mut best = s.fod(&start);
        if best.is_nan() { return (start, best) }
        let mut delta = SEARCH_START;
        for _ in 0..SEARCH_MAX_ITERATIONS {
            if delta < SEARCH_PRECISION { break }
            let frame = Frame::around(&best_dir);
            let (sin, cos) = delta.sin_cos();
            let mut moved = false;
            for (u, v) in [(sin, 0.0), (-sin, 0.0), (0.0, sin), (0.0, -sin)] {
                let candidate = frame.to_world(u, v, cos);
                let a = s.fod(&candidate);
                if a > best {
                    best = a;
                    best_dir = candidate;
                    moved = true;
                    break
                }
            }
            if !moved { delta *= 0.5 }
        }
        (best_dir.normalize(), best)
    }
}

impl<S: FieldSampler> Method for SdStream<'_, S> {

    fn initialise(&mut self, seed: &Seed) -> Option<Vector> {
        let start = self.state.initialise(seed)?;
        let (peak, a) = self.find_peak(start);
        if a > self.state.params.init_threshold { self.state.dir = Some(peak) }
        self.state.dir
    }

    fn advance(&mut self) -> bool {
        let Some(dir) = self.state.dir else { return false };
        if !self.state.get_data() { return false }
        let (peak, a) = self.find_peak(dir);
        // NaN fails this comparison
        if !(a >= self.state.params.threshold) { return false }
        if angle_between(&dir, &peak) > self.state.params.max_angle { return false }
        self.state.dir = Some(peak);
        self.state.pos += peak * self.state.params.step_size;
        true
    }

    fn position (&self) -> Point          { self.state.pos }
    fn direction(&self) -> Option<Vector> { self.state.dir }

    fn restart(&mut self, position: Point, direction: Vector) {
        self.state.restart(position, direction);
    }
}
