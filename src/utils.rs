use std::str::FromStr;

use geometry::Sphere;

use crate::{Error, Point, Result};

/// Parse `"x,y,z"`
pub fn parse_triplet<T: FromStr>(s: &str) -> Result<(T, T, T)>
where
    <T as FromStr>::Err: std::fmt::Display,
{
    let v = s.split(',').map(str::trim).collect::<Vec<_>>();
    if v.len() != 3 {
        return Err(Error::config(format!("expected 3 comma-separated values, found `{s}`")))
    }
    let parse = |x: &str| x.parse::<T>().map_err(|e| Error::config(format!("`{x}` in `{s}`: {e}")));
    Ok((parse(v[0])?, parse(v[1])?, parse(v[2])?))
}

/// Parse `"x,y,z,r"` (all in mm) as a sphere.
///
/// `Ok(None)` if `s` does not have four comma-separated fields, so that it can
/// be interpreted in some other way; `Err` if it does, but they are not all
/// numbers, or the radius is not positive.
pub fn parse_sphere(s: &str) -> Result<Option<Sphere>> {
    let v = s.split(',').map(str::trim).collect::<Vec<_>>();
    if v.len() != 4 { return Ok(None) }
    let (x, y, z) = parse_triplet::<f32>(&v[..3].join(","))?;
    let r: f32 = v[3].parse().map_err(|e| Error::config(format!("sphere radius in `{s}`: {e}")))?;
    if !(r > 0.0 && r.is_finite()) {
        return Err(Error::config(format!("sphere radius must be positive, in `{s}`")))
    }
    Ok(Some(Sphere::new(Point::new(x, y, z), r)))
}

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

pub mod timing {

    use super::group_digits;
    use std::time::Instant;
    use std::io::Write;

    pub struct Progress {
        previous: Instant,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now() } }

        /// Print message, append ellipsis, flush stdout, stay on same line, start timer.
        pub fn start(&mut self, message: &str) {
            print!("{message} ... ");
            // A failed flush only delays the message
            let _ = std::io::stdout().flush();
            self.start_timer();
        }

        // Print time elapsed since last start or done
        pub fn done(&mut self) {
            println!("{} ms", group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        // Print message followed by time elapsed since last start or done
        pub fn done_with_message(&mut self, message: &str) {
            println!("{message}: {} ms",
                     group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}
