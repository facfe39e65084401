use crate::types::Point;

/// Ordered sequence of points traced through the field.
///
/// An empty streamline marks a rejected attempt: it still travels down the
/// pipeline so that attempts can be counted, but is never written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Streamline {
    points: Vec<Point>,
    seed_index: usize,
}

impl Streamline {

    pub fn new(seed: Point) -> Self { Self { points: vec![seed], seed_index: 0 } }

    pub fn rejected() -> Self { Self::default() }

    pub fn push(&mut self, p: Point) { self.points.push(p) }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn points(&self) -> &[Point] { &self.points }

    /// Position of the seed point within `points`
    pub fn seed_index(&self) -> usize { self.seed_index }

    pub fn last(&self) -> Option<&Point> { self.points.last() }

    /// Reverse the point order, keeping track of the seed
    pub fn reverse(&mut self) {
        self.points.reverse();
        if !self.points.is_empty() {
            self.seed_index = self.points.len() - 1 - self.seed_index;
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.seed_index = 0;
    }

    /// Sum of segment lengths, in mm
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

impl From<Vec<Point>> for Streamline {
    fn from(points: Vec<Point>) -> Self { Self { points, seed_index: 0 } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn reversal_tracks_the_seed() {
        let mut s = Streamline::new(Point::origin());
        s.push(Point::new(0.0, 0.0, 1.0));
        s.push(Point::new(0.0, 0.0, 2.0));
        s.reverse();
        assert_eq!(s.seed_index(), 2);
        assert_eq!(s.last(), Some(&Point::origin()));
        s.push(Point::new(0.0, 0.0, -1.0));
        assert_eq!(s.len(), 4);
        assert_float_eq!(s.length(), 3.0, ulps <= 1);
    }

    #[test]
    fn cleared_streamline_is_rejected() {
        let mut s = Streamline::new(Point::origin());
        s.push(Point::new(1.0, 0.0, 0.0));
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s, Streamline::rejected());
    }
}
