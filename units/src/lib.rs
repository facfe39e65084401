//! Physical quantities used throughout `fodtrack`.
//!
//! Lengths are stored in millimetres, which is the natural unit of scanner
//! space, so that converting to and from raw `f32`s in hot loops is free.

pub mod todo;

pub use uom;

pub mod mmps {

  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (millimeter, kilogram, second, ampere, kelvin, mole, candela));

    /// The full circle constant (τ) Equal to 2π.
    pub const TWOPI: Angle = Angle {
        dimension: std::marker::PhantomData,
        units: std::marker::PhantomData,
        value: std::f32::consts::TAU,
    };
  }

}

pub use uom::si::Quantity;
pub use mmps::f32::{Angle, Length, Ratio, TWOPI};

mod units {
  pub use uom::si::{length::{micrometer, millimeter, centimeter},
                    ratio ::ratio,
                    angle ::{radian, degree},
  };
}

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(um     Length  micrometer);
wrap!(mm     Length  millimeter);
wrap!(cm     Length  centimeter);
wrap!(ratio  Ratio        ratio);
wrap!(radian Angle       radian);
wrap!(degree Angle       degree);

// Reverse direction of the above.
pub fn mm_    (x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn ratio_ (x: Ratio ) -> f32 { x.get::<units::ratio>() }
pub fn radian_(x: Angle ) -> f32 { x.get::<units::radian>() }
pub fn degree_(x: Angle ) -> f32 { x.get::<units::degree>() }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use uom::si::length::millimeter;

  #[test]
  fn lengths_sum_in_millimetres() {
    let v = vec![mm(1.0), cm(1.0), um(500.0)];
    let total: Length = v.into_iter().sum();
    assert_uom_eq!(millimeter, total, mm(11.5), ulps <= 1);
  }

  #[test]
  fn lengths_parse_with_units() {
    let step: Length = "0.2 mm".parse().unwrap();
    assert_eq!(mm_(step), 0.2);
    let step: Length = "2 cm".parse().unwrap();
    assert_uom_eq!(millimeter, step, mm(20.0), ulps <= 1);
  }

  #[test]
  fn ratio_of_lengths_is_dimensionless() {
    let r: Ratio = mm(1.0) / cm(4.0);
    float_eq::assert_float_eq!(ratio_(r), 0.25, ulps <= 1);
  }

  #[test]
  fn angles_convert() {
    float_eq::assert_float_eq!(degree_(radian(std::f32::consts::PI)), 180.0, ulps <= 1);
    float_eq::assert_float_eq!(radian_(TWOPI), std::f32::consts::TAU, ulps <= 1);
  }
}
