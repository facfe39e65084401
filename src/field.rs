//! Volumes of per-voxel SH coefficients, and continuous sampling of them.

use std::path::Path;

use ndarray::{s, Array4, ArrayView1, ShapeBuilder};

use crate::grid::Grid;
use crate::io::raw;
use crate::types::{Index3_u, Point};
use crate::{Error, Result};

/// Source of the FOD coefficient vector at arbitrary scanner-space positions.
///
/// Each tracking thread owns its own sampler, so implementations are free to
/// keep per-thread scratch state.
pub trait FieldSampler {

    /// Length of the coefficient vector produced by `sample`
    fn n_values(&self) -> usize;

    /// Write the coefficients at `position` into `values`.
    ///
    /// Returns `false` if `position` lies outside the field of view or the
    /// interpolated data are not finite; the contents of `values` are then
    /// unspecified.
    fn sample(&mut self, position: &Point, values: &mut [f32]) -> bool;
}

/// A grid of coefficient vectors
#[derive(Clone, Debug)]
pub struct Volume {
    pub grid: Grid,
    // [x, y, z, coefficient], coefficient index varying fastest
    data: Array4<f32>,
}

impl Volume {

    /// `data` is laid out as on disk: x fastest, coefficient index slowest
    pub fn new(grid: Grid, n_values: usize, data: Vec<f32>) -> Result<Self> {
        let [nx, ny, nz] = grid.n;
        let expected = grid.n_voxels() * n_values;
        if data.len() != expected {
            return Err(Error::SizeMismatch { what: "FOD volume".into(), expected, found: data.len() })
        }
        if n_values == 0 {
            return Err(Error::config("FOD volume must have at least one coefficient per voxel"))
        }
        let data = Array4::from_shape_vec((nx, ny, nz, n_values).f(), data)
            .map_err(|e| Error::config(e.to_string()))?
            .as_standard_layout()
            .into_owned();
        Ok(Self { grid, data })
    }

    pub fn from_raw_file(path: &Path, grid: Grid, n_values: usize) -> Result<Self> {
        let data = raw::read_exactly(path, grid.n_voxels() * n_values)?;
        Self::new(grid, n_values, data)
    }

    pub fn n_values(&self) -> usize { self.data.shape()[3] }

    pub fn voxel(&self, [i, j, k]: Index3_u) -> ArrayView1<'_, f32> {
        self.data.slice(s![i, j, k, ..])
    }

    pub fn sampler(&self) -> Trilinear<'_> { Trilinear { volume: self } }
}

/// Trilinear interpolation between the eight voxels surrounding a point.
///
/// Points up to half a voxel beyond the outermost voxel centres are still
/// inside the field of view; there the edge voxels are repeated.
#[derive(Clone, Copy, Debug)]
pub struct Trilinear<'v> {
    volume: &'v Volume,
}

impl FieldSampler for Trilinear<'_> {

    fn n_values(&self) -> usize { self.volume.n_values() }

    fn sample(&mut self, position: &Point, values: &mut [f32]) -> bool {
        let grid = &self.volume.grid;
        let v = grid.voxel_coordinates(position);

        let mut base = [0_isize; 3];
        let mut frac = [0_f32;   3];
        for d in 0..3 {
            let x = v[d];
            // Negated comparison catches NaN
            if !(x >= -0.5 && x <= grid.n[d] as f32 - 0.5) { return false }
            let floor = x.floor();
            base[d] = floor as isize;
            frac[d] = x - floor;
        }

        let clamp = |i: isize, d: usize| i.clamp(0, grid.n[d] as isize - 1) as usize;
        values.fill(0.0);
        for corner in 0..8_usize {
            let offset = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1];
            let mut weight = 1.0;
            let mut index = [0; 3];
            for d in 0..3 {
                weight *= if offset[d] == 1 { frac[d] } else { 1.0 - frac[d] };
                index[d] = clamp(base[d] + offset[d] as isize, d);
            }
            if weight == 0.0 { continue }
            for (out, &c) in values.iter_mut().zip(self.volume.voxel(index)) {
                *out += weight * c;
            }
        }
        values.first().map_or(false, |c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;
    use units::mm;

    /// 3x2x2 grid with two values per voxel: the x index and ten times the z index
    fn ramp() -> Volume {
        let grid = Grid::new((3, 2, 2), (mm(1.0), mm(1.0), mm(1.0)), (mm(0.0), mm(0.0), mm(0.0)));
        let mut data = vec![];
        for value in 0..2 {
            for z in 0..2 {
                for _y in 0..2 {
                    for x in 0..3 {
                        data.push(if value == 0 { x as f32 } else { 10.0 * z as f32 });
                    }
                }
            }
        }
        Volume::new(grid, 2, data).unwrap()
    }

    #[test]
    fn disk_layout_is_transposed_to_voxel_major() {
        let v = ramp();
        assert_eq!(v.n_values(), 2);
        assert_eq!(v.voxel([2, 1, 1]).to_vec(), vec![2.0, 10.0]);
        assert_eq!(v.voxel([1, 0, 0]).to_vec(), vec![1.0,  0.0]);
    }

    #[rstest(/**/ point,           expected,
             case((0.0, 0.0, 0.0), (0.0,  0.0)),
             case((1.5, 0.3, 0.0), (1.5,  0.0)),
             case((0.2, 0.7, 0.5), (0.2,  5.0)),
             case((2.4, 1.0, 1.0), (2.0, 10.0)), // beyond last centre: edge repeated
             case((-0.5, 0.0,-0.5),(0.0,  0.0)),
    )]
    fn trilinear_interpolation(point: (f32, f32, f32), expected: (f32, f32)) {
        let v = ramp();
        let mut sampler = v.sampler();
        let mut values = [0.0; 2];
        let (x, y, z) = point;
        assert!(sampler.sample(&Point::new(x, y, z), &mut values));
        assert_float_eq!((values[0], values[1]), expected, abs <= (1e-5, 1e-4));
    }

    #[rstest(/**/ point,
             case((-0.6, 0.0, 0.0)),
             case(( 2.6, 0.0, 0.0)),
             case(( 0.0, 1.6, 0.0)),
             case(( 0.0, 0.0,-0.51)),
             case((f32::NAN, 0.0, 0.0)),
    )]
    fn outside_field_of_view(point: (f32, f32, f32)) {
        let v = ramp();
        let mut values = [0.0; 2];
        let (x, y, z) = point;
        assert!(!v.sampler().sample(&Point::new(x, y, z), &mut values));
    }

    #[test]
    fn non_finite_data_is_invalid() {
        let grid = Grid::new((1, 1, 1), (mm(1.0), mm(1.0), mm(1.0)), (mm(0.0), mm(0.0), mm(0.0)));
        let v = Volume::new(grid, 1, vec![f32::NAN]).unwrap();
        let mut values = [0.0];
        assert!(!v.sampler().sample(&Point::origin(), &mut values));
    }

    #[test]
    fn wrong_size_is_rejected() {
        let grid = Grid::new((2, 2, 2), (mm(1.0), mm(1.0), mm(1.0)), (mm(0.0), mm(0.0), mm(0.0)));
        assert!(matches!(Volume::new(grid, 3, vec![0.0; 23]),
                         Err(Error::SizeMismatch { expected: 24, found: 23, .. })));
    }
}
