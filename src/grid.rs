/// The size and granularity of the voxel grid on which FOD coefficients and
/// mask regions are defined.
///
/// Voxel centres lie at integer voxel coordinates: voxel `[i,j,k]` is centred
/// at `origin + (i,j,k) * voxel_size` in scanner space, and covers half a
/// voxel on either side of that centre.

use crate::types::{BoxDim_u, Index1_u, Index3_u, Length, Point, Vector};
use units::mm_;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub n: BoxDim_u,
    pub voxel_size: Vector,
    pub origin: Point,
}

impl Grid {

    pub fn new(
        (nx, ny, nz): (usize, usize, usize),
        voxel_size: (Length, Length, Length),
        origin    : (Length, Length, Length),
    ) -> Self {
        let (dx, dy, dz) = voxel_size;
        let (ox, oy, oz) = origin;
        Self {
            n: [nx, ny, nz],
            voxel_size: Vector::new(mm_(dx), mm_(dy), mm_(dz)),
            origin    : Point ::new(mm_(ox), mm_(oy), mm_(oz)),
        }
    }

    pub fn n_voxels(&self) -> usize { self.n.iter().product() }

    /// Volume of a single voxel, in mm³
    pub fn voxel_volume(&self) -> f32 { self.voxel_size.iter().product() }

    /// Find centre of voxel with given 3D index
    pub fn voxel_centre(&self, [i, j, k]: Index3_u) -> Point {
        self.origin + Vector::new(i as f32, j as f32, k as f32).component_mul(&self.voxel_size)
    }

    /// Find centre of voxel with given 1D index
    pub fn voxel_centre1(&self, i: Index1_u) -> Point { self.voxel_centre(self.index3(i)) }

    /// Continuous voxel coordinates of a scanner-space point
    pub fn voxel_coordinates(&self, p: &Point) -> Vector {
        (p - self.origin).component_div(&self.voxel_size)
    }

    /// Index of the voxel containing `p`, if any
    pub fn voxel_containing(&self, p: &Point) -> Option<Index3_u> {
        let v = self.voxel_coordinates(p);
        let mut index = [0; 3];
        for d in 0..3 {
            // Each voxel owns the half-open interval [c - 1/2, c + 1/2)
            let r = (v[d] + 0.5).floor();
            // Negated comparison catches NaN
            if !(r >= 0.0 && r < self.n[d] as f32) { return None }
            index[d] = r as usize;
        }
        Some(index)
    }

    /// x varies fastest
    pub fn index1(&self, [i, j, k]: Index3_u) -> Index1_u {
        let [nx, ny, _] = self.n;
        i + nx * (j + ny * k)
    }

    pub fn index3(&self, i: Index1_u) -> Index3_u {
        let [nx, ny, _] = self.n;
        [i % nx, (i / nx) % ny, i / (nx * ny)]
    }
}
