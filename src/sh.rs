//! Real, orthonormal, even-order spherical harmonics.
//!
//! An FOD of maximum harmonic order `lmax` (even) is described by
//! `(lmax+1)(lmax+2)/2` coefficients. The coefficient of degree `l` and order
//! `m` (`-l <= m <= l`) lives at index `l(l+1)/2 + m`: orders `m > 0` multiply
//! `cos(mφ)` harmonics, orders `m < 0` multiply `sin(|m|φ)` harmonics.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::types::Vector;
use crate::{Error, Result};

/// Number of coefficients in an even-order basis up to `lmax`
pub const fn n_for_lmax(lmax: usize) -> usize { (lmax + 1) * (lmax + 2) / 2 }

/// Inverse of `n_for_lmax`, if `n` is a valid coefficient count
pub fn lmax_for_n(n: usize) -> Option<usize> {
    (0..=64).step_by(2).find(|&l| n_for_lmax(l) == n)
}

#[inline]
pub fn index(l: usize, m: isize) -> usize { ((l * (l + 1) / 2) as isize + m) as usize }

/// Index of P̄ₗᵐ, for `m >= 0` and every `l` (odd included), in a flat triangle
#[inline]
fn legendre_index(l: usize, m: usize) -> usize { l * (l + 1) / 2 + m }

/// Orthonormalized associated Legendre functions P̄ₗᵐ(x), for `0 <= m <= l <=
/// lmax`, without the Condon-Shortley phase.
///
/// The normalization is such that P̄ₗᵐ(cos θ) e^{imφ} is the orthonormal
/// complex harmonic.
fn associated_legendre(lmax: usize, x: f64, out: &mut [f64]) {
    let x = x.clamp(-1.0, 1.0);
    let sin = (1.0 - x * x).max(0.0).sqrt();
    let mut pmm = 1.0 / (4.0 * PI).sqrt();
    for m in 0..=lmax {
        let mf = m as f64;
        if m > 0 { pmm *= ((2.0 * mf + 1.0) / (2.0 * mf)).sqrt() * sin; }
        out[legendre_index(m, m)] = pmm;
        if m == lmax { break }
        out[legendre_index(m + 1, m)] = x * (2.0 * mf + 3.0).sqrt() * pmm;
        for l in m + 2..=lmax {
            let lf = l as f64;
            let a = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
            let b = (((lf - 1.0) * (lf - 1.0) - mf * mf) / (4.0 * (lf - 1.0) * (lf - 1.0) - 1.0)).sqrt();
            out[legendre_index(l, m)] =
                a * (x * out[legendre_index(l - 1, m)] - b * out[legendre_index(l - 2, m)]);
        }
    }
}

/// Associated Legendre functions tabulated over the polar angle θ ∈ [0, π],
/// linearly interpolated on lookup.
#[derive(Debug)]
pub struct LegendreTable {
    n_functions: usize,
    increment: f64,
    values: Vec<f32>,
}

impl LegendreTable {

    pub fn new(lmax: usize, n_samples: usize) -> Self {
        let n_samples = n_samples.max(2);
        let n_functions = legendre_index(lmax, lmax) + 1;
        let increment = PI / (n_samples - 1) as f64;
        let mut row = vec![0.0; n_functions];
        let mut values = Vec::with_capacity(n_samples * n_functions);
        for i in 0..n_samples {
            associated_legendre(lmax, (i as f64 * increment).cos(), &mut row);
            values.extend(row.iter().map(|&v| v as f32));
        }
        Self { n_functions, increment, values }
    }

    fn get(&self, theta: f64, out: &mut [f64]) {
        let n_rows = self.values.len() / self.n_functions;
        let position = (theta / self.increment).clamp(0.0, (n_rows - 1) as f64);
        let i = (position.floor() as usize).min(n_rows - 2);
        let f = position - i as f64;
        let lo = &self.values[ i      * self.n_functions..(i + 1) * self.n_functions];
        let hi = &self.values[(i + 1) * self.n_functions..(i + 2) * self.n_functions];
        for ((o, &a), &b) in out.iter_mut().zip(lo).zip(hi) {
            *o = (1.0 - f) * a as f64 + f * b as f64;
        }
    }
}

/// Number of polar angle samples in precomputed Legendre tables
pub const TABLE_SIZE: usize = 1024;

/// Evaluator of FOD amplitudes along arbitrary directions.
///
/// Holds scratch space, so each thread needs its own clone. Clones share any
/// precomputed table.
#[derive(Clone, Debug)]
pub struct Amplitude {
    lmax: usize,
    n_coefficients: usize,
    table: Option<Arc<LegendreTable>>,
    legendre: Vec<f64>,
}

impl Amplitude {

    pub fn new(n_coefficients: usize, precomputed: bool) -> Result<Self> {
        let lmax = lmax_for_n(n_coefficients).ok_or_else(|| Error::config(format!(
            "{n_coefficients} values per voxel is not a valid even-order SH coefficient count"
        )))?;
        let table = precomputed.then(|| Arc::new(LegendreTable::new(lmax, TABLE_SIZE)));
        let legendre = vec![0.0; legendre_index(lmax, lmax) + 1];
        Ok(Self { lmax, n_coefficients, table, legendre })
    }

    /// FOD amplitude along unit vector `dir`.
    ///
    /// NaN if `coefficients` is too short for this evaluator's `lmax`.
    pub fn value(&mut self, coefficients: &[f32], dir: &Vector) -> f32 {
        if coefficients.len() < self.n_coefficients { return f32::NAN }
        let (x, y, z) = (dir.x as f64, dir.y as f64, dir.z as f64);
        let rho = (x * x + y * y).sqrt();
        match &self.table {
            Some(table) => table.get(rho.atan2(z), &mut self.legendre),
            None        => associated_legendre(self.lmax, z / (rho * rho + z * z).sqrt(), &mut self.legendre),
        }
        let phi = y.atan2(x);
        let c = |l, m| coefficients[index(l, m)] as f64;
        let mut sum = 0.0;
        for l in (0..=self.lmax).step_by(2) {
            sum += c(l, 0) * self.legendre[legendre_index(l, 0)];
            for m in 1..=l {
                let (sin, cos) = (m as f64 * phi).sin_cos();
                let p = std::f64::consts::SQRT_2 * self.legendre[legendre_index(l, m)];
                sum += p * (c(l, m as isize) * cos + c(l, -(m as isize)) * sin);
            }
        }
        sum as f32
    }
}

/// Coefficients of the band-limited delta function pointing along `dir`: the
/// value of each basis function at `dir`.
///
/// Its amplitude peaks along `±dir`, which makes it a convenient single-fibre
/// FOD.
pub fn delta(dir: &Vector, lmax: usize) -> Vec<f32> {
    let n = n_for_lmax(lmax);
    let mut basis = Amplitude {
        lmax,
        n_coefficients: n,
        table: None,
        legendre: vec![0.0; legendre_index(lmax, lmax) + 1],
    };
    let mut unit = vec![0.0; n];
    (0..n).map(|i| {
        unit[i] = 1.0;
        let v = basis.value(&unit, dir);
        unit[i] = 0.0;
        v
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;
    use rand::{Rng, SeedableRng};
    use rand_isaac::Isaac64Rng;
    use geometry::random_unit_vector;

    #[rstest(/**/ lmax, n,
             case(0,  1),
             case(2,  6),
             case(4, 15),
             case(8, 45),
    )]
    fn coefficient_counts(lmax: usize, n: usize) {
        assert_eq!(n_for_lmax(lmax), n);
        assert_eq!(lmax_for_n(n), Some(lmax));
    }

    #[test]
    fn invalid_coefficient_count() {
        assert_eq!(lmax_for_n(7), None);
        assert!(Amplitude::new(7, false).is_err());
    }

    #[test]
    fn constant_term_is_isotropic() {
        let mut amp = Amplitude::new(1, false).unwrap();
        let expected = 1.0 / (4.0 * std::f32::consts::PI).sqrt();
        for dir in [Vector::x(), Vector::y(), -Vector::z(), Vector::new(1.0, 2.0, 3.0).normalize()] {
            assert_float_eq!(amp.value(&[1.0], &dir), expected, rmax <= 1e-6);
        }
    }

    #[test]
    fn known_l2_harmonics() {
        // Y₂₀ = √(5/16π) (3z² - 1), Y₂₂ = √(15/16π) (x² - y²), Y₂₋₂ = √(15/4π) xy
        let mut amp = Amplitude::new(6, false).unwrap();
        let d = Vector::new(0.3, -0.5, 0.7).normalize();
        let pi = std::f32::consts::PI;
        let mut unit = |i: usize| { let mut c = [0.0; 6]; c[i] = 1.0; amp.value(&c, &d) };
        assert_float_eq!(unit(index(2, 0)), (5.0 / (16.0 * pi)).sqrt() * (3.0 * d.z * d.z - 1.0), abs <= 1e-5);
        assert_float_eq!(unit(index(2, 2)), (15.0 / (16.0 * pi)).sqrt() * (d.x * d.x - d.y * d.y), abs <= 1e-5);
        assert_float_eq!(unit(index(2,-2)), (15.0 / ( 4.0 * pi)).sqrt() * d.x * d.y, abs <= 1e-5);
    }

    #[rstest(/**/ l, m,
             case(0, 0),
             case(2, 1),
             case(4,-3),
             case(6, 6),
             case(8,-8),
    )]
    fn basis_functions_are_normalized(l: usize, m: isize) {
        // Midpoint rule over θ and φ
        let mut amp = Amplitude::new(n_for_lmax(8), false).unwrap();
        let mut c = vec![0.0; n_for_lmax(8)];
        c[index(l, m)] = 1.0;
        let (n_theta, n_phi) = (200, 400);
        let (d_theta, d_phi) = (std::f32::consts::PI / n_theta as f32, std::f32::consts::TAU / n_phi as f32);
        let mut integral = 0.0_f64;
        for i in 0..n_theta {
            let theta = (i as f32 + 0.5) * d_theta;
            for j in 0..n_phi {
                let phi = (j as f32 + 0.5) * d_phi;
                let d = Vector::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
                let v = amp.value(&c, &d) as f64;
                integral += v * v * (theta.sin() * d_theta * d_phi) as f64;
            }
        }
        assert_float_eq!(integral, 1.0, abs <= 1e-2);
    }

    #[test]
    fn precomputed_table_agrees_with_direct_evaluation() {
        let n = n_for_lmax(8);
        let mut direct = Amplitude::new(n, false).unwrap();
        let mut table  = Amplitude::new(n, true ).unwrap();
        let mut rng = Isaac64Rng::seed_from_u64(3);
        for _ in 0..100 {
            let c: Vec<f32> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
            let d = random_unit_vector(&mut rng);
            assert_float_eq!(table.value(&c, &d), direct.value(&c, &d), abs <= 5e-3);
        }
        // Both poles are tabulated exactly
        let c: Vec<f32> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
        for d in [Vector::z(), -Vector::z()] {
            assert_float_eq!(table.value(&c, &d), direct.value(&c, &d), abs <= 1e-4);
        }
    }

    #[test]
    fn delta_peaks_along_its_axis() {
        let axis = Vector::new(1.0, -1.0, 0.5).normalize();
        let c = delta(&axis, 8);
        let mut amp = Amplitude::new(c.len(), false).unwrap();
        let peak = amp.value(&c, &axis);
        assert_float_eq!(amp.value(&c, &-axis), peak, rmax <= 1e-4);
        let mut rng = Isaac64Rng::seed_from_u64(9);
        for _ in 0..200 {
            let d = random_unit_vector(&mut rng);
            assert!(amp.value(&c, &d) <= peak + 1e-4);
        }
        // Σ (2l+1)/4π over even l ≤ 8
        let expected: f32 = (0..=8).step_by(2).map(|l| (2 * l + 1) as f32).sum::<f32>() / (4.0 * std::f32::consts::PI);
        assert_float_eq!(peak, expected, rmax <= 1e-4);
    }

    #[test]
    fn short_coefficient_vector_gives_nan() {
        let mut amp = Amplitude::new(6, false).unwrap();
        assert!(amp.value(&[1.0, 0.0], &Vector::z()).is_nan());
    }
}
