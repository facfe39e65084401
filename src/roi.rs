//! Regions of interest: where streamlines start, must pass, must not pass, and
//! may not leave.

use std::path::Path;

use rand::Rng;
use rayon::prelude::*;

use geometry::Sphere;

use crate::grid::Grid;
use crate::io::raw;
use crate::types::{Index3_u, Point, Vector};
use crate::utils::parse_sphere;
use crate::{Error, Result};

/// Binary voxel mask on the FOD grid
#[derive(Clone, Debug)]
pub struct Mask {
    grid: Grid,
    inside: Vec<bool>,
    voxels: Vec<Index3_u>,
}

impl Mask {

    /// Voxels with finite, non-zero `values` are inside the mask
    pub fn new(grid: Grid, values: &[f32]) -> Result<Self> {
        if values.len() != grid.n_voxels() {
            return Err(Error::SizeMismatch { what: "mask".into(), expected: grid.n_voxels(), found: values.len() })
        }
        let inside: Vec<bool> = values.par_iter().map(|&v| v != 0.0 && v.is_finite()).collect();
        let voxels = inside.par_iter()
            .enumerate()
            .filter(|(_, &inside)| inside)
            .map(|(i, _)| grid.index3(i))
            .collect();
        Ok(Self { grid, inside, voxels })
    }

    pub fn from_raw_file(path: &Path, grid: Grid) -> Result<Self> {
        Self::new(grid, &raw::read_exactly(path, grid.n_voxels())?)
    }

    pub fn contains(&self, p: &Point) -> bool {
        self.grid.voxel_containing(p)
            .map_or(false, |i| self.inside[self.grid.index1(i)])
    }

    pub fn n_voxels_inside(&self) -> usize { self.voxels.len() }

    pub fn volume(&self) -> f32 { self.voxels.len() as f32 * self.grid.voxel_volume() }

    /// Uniformly distributed point within the mask: a random voxel, jittered
    /// uniformly across its extent. `None` for an empty mask.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point> {
        if self.voxels.is_empty() { return None }
        let voxel = self.voxels[rng.gen_range(0..self.voxels.len())];
        let jitter = Vector::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5);
        Some(self.grid.voxel_centre(voxel) + jitter.component_mul(&self.grid.voxel_size))
    }
}

#[derive(Clone, Debug)]
pub enum Roi {
    Mask(Mask),
    Sphere(Sphere),
}

impl Roi {

    /// `"x,y,z,r"` (in mm) describes a sphere; anything else is taken to be the
    /// path of a raw mask volume on `grid`, relative to `base_dir`.
    pub fn parse(spec: &str, grid: &Grid, base_dir: &Path) -> Result<Self> {
        if let Some(sphere) = parse_sphere(spec)? {
            return Ok(Roi::Sphere(sphere))
        }
        Ok(Roi::Mask(Mask::from_raw_file(&base_dir.join(spec), *grid)?))
    }

    pub fn contains(&self, p: &Point) -> bool {
        match self {
            Roi::Mask  (m) => m.contains(p),
            Roi::Sphere(s) => s.contains(p),
        }
    }

    pub fn volume(&self) -> f32 {
        match self {
            Roi::Mask  (m) => m.volume(),
            Roi::Sphere(s) => s.volume(),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point> {
        match self {
            Roi::Mask  (m) => m.sample(rng),
            Roi::Sphere(s) => Some(s.sample(rng)),
        }
    }
}

/// Where a streamline starts
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Seed {
    pub position: Point,
    /// Initial direction, if the seed region prescribes one
    pub direction: Option<Vector>,
}

/// An ordered collection of regions
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    rois: Vec<Roi>,
}

impl RegionSet {

    pub fn new(rois: Vec<Roi>) -> Self { Self { rois } }

    pub fn len(&self) -> usize { self.rois.len() }

    pub fn is_empty(&self) -> bool { self.rois.is_empty() }

    /// Index of the first region containing `p`
    pub fn contains(&self, p: &Point) -> Option<usize> {
        self.rois.iter().position(|roi| roi.contains(p))
    }

    /// Set `flags[i]` for every region `i` containing `p`
    pub fn mark(&self, p: &Point, flags: &mut [bool]) {
        for (flag, roi) in flags.iter_mut().zip(&self.rois) {
            if !*flag && roi.contains(p) { *flag = true; }
        }
    }

    /// Random seed point from the union of the regions, each region chosen
    /// with probability proportional to its volume.
    pub fn sample_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Seed> {
        if self.rois.is_empty() { return Err(Error::NoSeedRegions) }
        let total: f32 = self.rois.iter().map(Roi::volume).sum();
        if !(total > 0.0) { return Err(Error::config("seed regions are empty")) }
        let mut r = rng.gen::<f32>() * total;
        let mut chosen = self.rois.iter().filter(|roi| roi.volume() > 0.0).last();
        for roi in &self.rois {
            let v = roi.volume();
            if r < v && v > 0.0 { chosen = Some(roi); break }
            r -= v;
        }
        let position = chosen
            .and_then(|roi| roi.sample(rng))
            .ok_or_else(|| Error::config("seed regions are empty"))?;
        Ok(Seed { position, direction: None })
    }
}

/// All the regions that constrain a tracking run
#[derive(Clone, Debug, Default)]
pub struct Rois {
    pub seed   : RegionSet,
    pub include: RegionSet,
    pub exclude: RegionSet,
    /// Streamlines stop on leaving the union of these; empty means no limit
    pub mask   : RegionSet,
}

impl Rois {

    pub fn within_mask(&self, p: &Point) -> bool {
        self.mask.is_empty() || self.mask.contains(p).is_some()
    }
}
