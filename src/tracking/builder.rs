//! The per-streamline state machine: seed, grow forwards, grow backwards,
//! accept or reject.

use rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use super::method::Method;
use super::params::Parameters;
use super::streamline::Streamline;
use crate::roi::Rois;
use crate::types::{Point, Vector};
use crate::{Error, Result};

/// Seed points tried per streamline before the run is declared hopeless
pub const MAX_SEED_ATTEMPTS: usize = 10_000;

pub struct StreamlineBuilder<'r, M> {
    method: M,
    params: &'r Parameters,
    rois: &'r Rois,
    rng: Isaac64Rng,
    /// Which include regions the current streamline has visited
    included: Vec<bool>,
    excluded: bool,
}

impl<'r, M: Method> StreamlineBuilder<'r, M> {

    pub fn new(method: M, params: &'r Parameters, rois: &'r Rois, seed: u64) -> Self {
        Self {
            method,
            params,
            rois,
            rng: Isaac64Rng::seed_from_u64(seed),
            included: vec![false; rois.include.len()],
            excluded: false,
        }
    }

    /// Generate one streamline: empty if it was rejected.
    ///
    /// The only error is failing to initialise the method at any of
    /// `MAX_SEED_ATTEMPTS` seed points.
    pub fn generate(&mut self) -> Result<Streamline> {
        let (seed, seed_dir) = self.seed()?;
        self.included.iter_mut().for_each(|i| *i = false);
        self.excluded = false;

        let mut track = Streamline::new(seed);
        self.visit(&seed);
        if !self.excluded {
            self.grow(&mut track);
        }
        if !self.excluded && !self.params.unidirectional {
            track.reverse();
            self.method.restart(seed, -seed_dir);
            self.grow(&mut track);
        }

        if self.rejected(&track) { track.clear() }
        Ok(track)
    }

    fn seed(&mut self) -> Result<(Point, Vector)> {
        for _ in 0..MAX_SEED_ATTEMPTS {
            let seed = self.rois.seed.sample_seed(&mut self.rng)?;
            // Seeds become interior points once tracked in both directions
            if !self.rois.within_mask(&seed.position) { continue }
            if let Some(dir) = self.method.initialise(&seed) {
                return Ok((seed.position, dir))
            }
        }
        Err(Error::SeedExhausted(MAX_SEED_ATTEMPTS))
    }

    /// Extend `track` until the method gives up, a region stops it, or it
    /// reaches its maximum length.
    fn grow(&mut self, track: &mut Streamline) {
        while track.len() < self.params.max_num_points {
            if !self.method.advance() { break }
            let p = self.method.position();
            if !self.rois.within_mask(&p) { break }
            self.visit(&p);
            if self.excluded { break }
            track.push(p);
        }
    }

    fn visit(&mut self, p: &Point) {
        if self.rois.exclude.contains(p).is_some() {
            self.excluded = true;
            return
        }
        self.rois.include.mark(p, &mut self.included);
    }

    fn rejected(&self, track: &Streamline) -> bool {
        self.excluded
            || track.len() < self.params.min_num_points
            || !self.included.iter().all(|&i| i)
    }
}
