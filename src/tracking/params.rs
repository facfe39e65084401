//! Immutable, validated parameters of a tracking run, shared by all threads.

use serde::Deserialize;

use units::{mm, mm_, todo::{Amplitudef32, Anglef32, Lengthf32}, Length};

use crate::config::track::Tracking;
use crate::{Error, Result, Vector};

/// Propagation method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Algorithm {
    /// Probabilistic, one FOD sample per candidate direction
    Ifod1,
    /// Probabilistic, several FOD samples along each candidate arc
    Ifod2,
    /// Deterministic, following the nearest FOD peak
    SdStream,
}

impl Algorithm {

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Ifod1    => "iFOD1",
            Algorithm::Ifod2    => "iFOD2",
            Algorithm::SdStream => "SD_STREAM",
        }
    }

    fn default_curvature(self) -> Length {
        match self {
            Algorithm::Ifod1    => mm(1.0),
            Algorithm::Ifod2    => mm(0.5),
            Algorithm::SdStream => mm(2.0),
        }
    }

    fn default_number(self) -> usize {
        match self {
            Algorithm::Ifod2 => 1000,
            _                =>  100,
        }
    }

    fn default_trials(self) -> usize {
        match self {
            Algorithm::Ifod2 => 100,
            _                =>  50,
        }
    }

    /// Largest turning angle per step allowed by a minimum radius of
    /// curvature. Single-point methods bound the chord of the turn, iFOD2 the
    /// arc itself.
    pub fn max_angle(self, step: Lengthf32, min_radius: Lengthf32) -> Anglef32 {
        if min_radius.is_infinite() { return 0.0 }
        match self {
            Algorithm::Ifod2 => step / min_radius,
            _                => 2.0 * (step / (2.0 * min_radius)).clamp(-1.0, 1.0).asin(),
        }
    }
}

pub const DEFAULT_ALGORITHM  : Algorithm = Algorithm::Ifod2;
pub const DEFAULT_CUTOFF     : Amplitudef32 = 0.1;
pub const DEFAULT_SAMPLES    : usize = 3;
pub const ATTEMPTS_PER_TRACK : usize = 100;

fn default_step      () -> Length { mm(  0.2) }
fn default_length    () -> Length { mm(200.0) }
fn default_min_length() -> Length { mm( 10.0) }

#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    pub algorithm: Algorithm,
    pub step_size: Lengthf32,
    pub min_radius: Lengthf32,
    pub max_angle: Anglef32,
    pub threshold: Amplitudef32,
    pub init_threshold: Amplitudef32,
    pub min_num_points: usize,
    pub max_num_points: usize,
    pub max_trials: usize,
    pub max_num_tracks: usize,
    pub max_num_attempts: usize,
    pub unidirectional: bool,
    pub init_dir: Option<Vector>,
    pub precomputed: bool,
    /// FOD samples per candidate arc (iFOD2 only)
    pub num_samples: usize,
}

impl Parameters {

    pub fn new(options: &Tracking) -> Result<Self> {
        let algorithm = options.algorithm.unwrap_or(DEFAULT_ALGORITHM);

        let positive = |name: &str, value: Length| {
            let v = mm_(value);
            if v > 0.0 { Ok(v) } else { Err(Error::config(format!("{name} must be positive, got {v} mm"))) }
        };
        let finite = |name: &str, v: Lengthf32| {
            if v.is_finite() { Ok(v) } else { Err(Error::config(format!("{name} must be finite"))) }
        };

        let step_size  = finite("step", positive("step", options.step.unwrap_or_else(default_step))?)?;
        let min_radius = positive("curvature", options.curvature.unwrap_or_else(|| algorithm.default_curvature()))?;
        let max_length = finite("length", positive("length", options.length.unwrap_or_else(default_length))?)?;
        let min_length = mm_(options.min_length.unwrap_or_else(default_min_length));
        if !(min_length >= 0.0 && min_length <= max_length) {
            return Err(Error::config(format!("min_length must lie in [0, {max_length}] mm, got {min_length} mm")))
        }

        let threshold = options.cutoff.unwrap_or(DEFAULT_CUTOFF);
        let init_threshold = options.init_cutoff.unwrap_or(2.0 * threshold);
        for (name, value) in [("cutoff", threshold), ("init_cutoff", init_threshold)] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Error::config(format!("{name} must be a non-negative number, got {value}")))
            }
        }

        let max_num_tracks   = options.number.unwrap_or_else(|| algorithm.default_number());
        let max_num_attempts = options.max_attempts.unwrap_or(ATTEMPTS_PER_TRACK * max_num_tracks);
        let max_trials       = options.trials.unwrap_or_else(|| algorithm.default_trials());
        let num_samples      = options.samples.unwrap_or(DEFAULT_SAMPLES);
        if max_trials  == 0 { return Err(Error::config("trials must be at least 1" )) }
        if num_samples == 0 { return Err(Error::config("samples must be at least 1")) }

        let init_dir = options.init_direction.map(unit_vector).transpose()?;

        Ok(Self {
            algorithm,
            step_size,
            min_radius,
            max_angle: algorithm.max_angle(step_size, min_radius),
            threshold,
            init_threshold,
            min_num_points: (min_length / step_size).round() as usize,
            max_num_points: ((max_length / step_size).round() as usize).max(1),
            max_trials,
            max_num_tracks,
            max_num_attempts,
            unidirectional: options.unidirectional,
            init_dir,
            precomputed: options.precomputed.unwrap_or(true),
            num_samples,
        })
    }

    /// Key-value pairs describing the run, for track file headers
    pub fn properties(&self) -> Vec<(String, String)> {
        let mut p = vec![
            ("method"        .into(), self.algorithm.name().into()),
            ("step_size"     .into(), self.step_size.to_string()),
            ("min_curv"      .into(), self.min_radius.to_string()),
            ("max_dist"      .into(), (self.max_num_points as f32 * self.step_size).to_string()),
            ("min_dist"      .into(), (self.min_num_points as f32 * self.step_size).to_string()),
            ("threshold"     .into(), self.threshold.to_string()),
            ("init_threshold".into(), self.init_threshold.to_string()),
            ("max_num_tracks".into(), self.max_num_tracks.to_string()),
            ("max_trials"    .into(), self.max_trials.to_string()),
            ("unidirectional".into(), (self.unidirectional as u8).to_string()),
            ("sh_precomputed".into(), (self.precomputed as u8).to_string()),
        ];
        if self.algorithm == Algorithm::Ifod2 {
            p.push(("samples_per_step".into(), self.num_samples.to_string()));
        }
        if let Some(d) = self.init_dir {
            p.push(("init_direction".into(), format!("{},{},{}", d.x, d.y, d.z)));
        }
        p
    }
}

fn unit_vector(v: [f32; 3]) -> Result<Vector> {
    let d = Vector::from(v);
    let norm = d.norm();
    if norm > 0.0 && norm.is_finite() { Ok(d / norm) }
    else                              { Err(Error::InvalidInitDirection(v)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;

    fn params(options: Tracking) -> Parameters { Parameters::new(&options).unwrap() }

    #[test]
    fn defaults() {
        let p = params(Tracking::default());
        assert_eq!(p.algorithm, Algorithm::Ifod2);
        assert_float_eq!(p.step_size, 0.2, ulps <= 1);
        assert_eq!(p.max_num_points, 1000);
        assert_eq!(p.min_num_points, 50);
        assert_float_eq!(p.threshold, 0.1, ulps <= 1);
        assert_float_eq!(p.init_threshold, 0.2, ulps <= 1);
        assert_eq!(p.max_num_tracks, 1000);
        assert_eq!(p.max_num_attempts, 100_000);
        assert_eq!(p.max_trials, 100);
        assert_eq!(p.num_samples, 3);
        assert!(p.precomputed);
        assert!(!p.unidirectional);
        assert_eq!(p.init_dir, None);
    }

    #[rstest(/**/ algorithm,           number, trials,
             case(Algorithm::Ifod1,       100,     50),
             case(Algorithm::Ifod2,      1000,    100),
             case(Algorithm::SdStream,    100,     50),
    )]
    fn method_dependent_defaults(algorithm: Algorithm, number: usize, trials: usize) {
        let p = params(Tracking { algorithm: Some(algorithm), ..Tracking::default() });
        assert_eq!(p.max_num_tracks, number);
        assert_eq!(p.max_trials, trials);
        assert_eq!(p.max_num_attempts, 100 * number);
    }

    #[rstest(/**/ algorithm,           step, radius, expected,
             case(Algorithm::Ifod1,     1.0,    1.0, std::f32::consts::FRAC_PI_3),
             case(Algorithm::SdStream,  0.2,    0.1, std::f32::consts::PI), // saturated
             case(Algorithm::Ifod2,     0.5,    1.0, 0.5),
             case(Algorithm::Ifod1,     1.0, f32::INFINITY, 0.0),
             case(Algorithm::Ifod2,     1.0, f32::INFINITY, 0.0),
    )]
    fn max_angle_from_curvature(algorithm: Algorithm, step: f32, radius: f32, expected: f32) {
        assert_float_eq!(algorithm.max_angle(step, radius), expected, abs <= 1e-6);
    }

    #[test]
    fn init_threshold_follows_cutoff_unless_overridden() {
        let p = params(Tracking { cutoff: Some(0.3), ..Tracking::default() });
        assert_float_eq!(p.init_threshold, 0.6, ulps <= 1);
        let p = params(Tracking { cutoff: Some(0.3), init_cutoff: Some(0.4), ..Tracking::default() });
        assert_float_eq!(p.init_threshold, 0.4, ulps <= 1);
    }

    #[test]
    fn init_direction_is_normalized() {
        let p = params(Tracking { init_direction: Some([0.0, 3.0, 4.0]), ..Tracking::default() });
        let d = p.init_dir.unwrap();
        assert_float_eq!((d.x, d.y, d.z), (0.0, 0.6, 0.8), abs <= (1e-6, 1e-6, 1e-6));
    }

    #[rstest(/**/ options,
             case(Tracking { init_direction: Some([0.0, 0.0, 0.0]),      ..Tracking::default() }),
             case(Tracking { init_direction: Some([f32::NAN, 1.0, 0.0]), ..Tracking::default() }),
             case(Tracking { step      : Some(mm( 0.0)),                 ..Tracking::default() }),
             case(Tracking { step      : Some(mm(-1.0)),                 ..Tracking::default() }),
             case(Tracking { curvature : Some(mm( 0.0)),                 ..Tracking::default() }),
             case(Tracking { min_length: Some(mm(300.0)),                ..Tracking::default() }),
             case(Tracking { cutoff    : Some(-0.1),                     ..Tracking::default() }),
             case(Tracking { trials    : Some(0),                        ..Tracking::default() }),
             case(Tracking { samples   : Some(0),                        ..Tracking::default() }),
    )]
    fn malformed_options_are_rejected(options: Tracking) {
        assert!(Parameters::new(&options).is_err());
    }

    #[test]
    fn zero_init_direction_reports_the_vector() {
        let options = Tracking { init_direction: Some([0.0, 0.0, 0.0]), ..Tracking::default() };
        assert!(matches!(Parameters::new(&options), Err(Error::InvalidInitDirection([0.0, 0.0, 0.0]))));
    }

    #[test]
    fn header_properties() {
        let p = params(Tracking { algorithm: Some(Algorithm::Ifod1), ..Tracking::default() });
        let props = p.properties();
        assert!(props.contains(&("method".into(), "iFOD1".into())));
        assert!(!props.iter().any(|(k, _)| k == "samples_per_step"));
    }
}
