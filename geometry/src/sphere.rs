use rand::Rng;
use units::todo::Lengthf32;
use crate::Point;

/// Solid ball, specified by centre and radius in scanner space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub centre: Point,
    pub radius: Lengthf32,
}

impl Sphere {

    pub fn new(centre: Point, radius: Lengthf32) -> Self { Self { centre, radius } }

    /// Points on the surface count as inside
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        (p - self.centre).norm_squared() <= self.radius * self.radius
    }

    pub fn volume(&self) -> f32 {
        4.0 / 3.0 * std::f32::consts::PI * self.radius.powi(3)
    }

    /// Uniformly distributed point inside the ball, by rejection from the
    /// enclosing cube.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        loop {
            let x = 2.0 * rng.gen::<f32>() - 1.0;
            let y = 2.0 * rng.gen::<f32>() - 1.0;
            let z = 2.0 * rng.gen::<f32>() - 1.0;
            if x*x + y*y + z*z <= 1.0 {
                return self.centre + nalgebra::Vector3::new(x, y, z) * self.radius
            }
        }
    }
}
