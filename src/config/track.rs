//! Configuration file parser for `tckgen`
//!
//! ```toml
//! [tracking]
//! algorithm = "ifod2"
//! number    = 5000
//! step      = "0.5 mm"
//! curvature = "1 mm"
//!
//! [field]
//! file         = "fod.raw"
//! nvoxels      = [96, 96, 60]
//! coefficients = 45
//! voxel_size   = ["2 mm", "2 mm", "2 mm"]
//!
//! [roi]
//! seed    = ["wm.raw"]
//! include = ["-20,10,30,5"]
//! ```
//!
//! File names are relative to the directory containing the configuration file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use units::mm;

use crate::field::Volume;
use crate::grid::Grid;
use crate::roi::{RegionSet, Roi, Rois};
use crate::tracking::Algorithm;
use crate::{Error, Length, Result};

fn deserialize_uom_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(de::Error::custom)
}

fn deserialize_uom_3d<'d, D, T>(deserializer: D) -> std::result::Result<(T, T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y, z) = <(String, String, String)>::deserialize(deserializer)?;
    tr_tup_res((x.parse(), y.parse(), z.parse())).map_err(de::Error::custom)
}

fn deserialize_uom_3d_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String, String)>::deserialize(deserializer)?
        .map(|(x, y, z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
fn tr_tup_res<O, E>((x,y,z): (std::result::Result<O, E>, std::result::Result<O, E>, std::result::Result<O, E>))
                    -> std::result::Result<(O, O, O), E> {
    Ok((x?, y?, z?))
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub tracking: Tracking,
    pub field: Field,
    #[serde(default)]
    pub roi: RoiLists,
}

/// Tracking options. Anything left out takes a method-dependent default.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Tracking {
    pub algorithm: Option<Algorithm>,

    /// Number of streamlines to select
    pub number: Option<usize>,

    /// Number of streamlines to generate before giving up, selected or not
    pub max_attempts: Option<usize>,

    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_opt")]
    pub step: Option<Length>,

    /// Minimum radius of curvature
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_opt")]
    pub curvature: Option<Length>,

    /// Maximum streamline length
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_opt")]
    pub length: Option<Length>,

    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_opt")]
    pub min_length: Option<Length>,

    /// FOD amplitude below which streamlines stop
    pub cutoff: Option<f32>,

    /// FOD amplitude required to start a streamline
    pub init_cutoff: Option<f32>,

    /// Candidate directions drawn per step before giving up
    pub trials: Option<usize>,

    /// Track only forwards from the seed
    #[serde(default)]
    pub unidirectional: bool,

    /// Start every streamline in this direction
    pub init_direction: Option<[f32; 3]>,

    /// Tabulate Legendre functions rather than evaluating them directly
    pub precomputed: Option<bool>,

    /// FOD samples per step (iFOD2)
    pub samples: Option<usize>,

    /// Fixed base seed for the random number generators
    pub seed: Option<u64>,

    /// Number of streamline-generating threads
    pub threads: Option<usize>,

    pub queue_capacity: Option<usize>,
}

/// Raw FOD coefficient volume and its geometry
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Field {
    pub file: PathBuf,

    pub nvoxels: (usize, usize, usize),

    /// SH coefficients per voxel
    pub coefficients: usize,

    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub voxel_size: (Length, Length, Length),

    /// Scanner-space position of the centre of the first voxel
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub origin: Option<(Length, Length, Length)>,
}

/// Each entry is either `"x,y,z,r"` (a sphere, in mm) or the path of a raw
/// mask volume on the field's grid
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoiLists {
    #[serde(default)] pub seed   : Vec<String>,
    #[serde(default)] pub include: Vec<String>,
    #[serde(default)] pub exclude: Vec<String>,
    #[serde(default)] pub mask   : Vec<String>,
}

impl Field {

    pub fn grid(&self) -> Grid {
        Grid::new(self.nvoxels, self.voxel_size, self.origin.unwrap_or((mm(0.0), mm(0.0), mm(0.0))))
    }

    pub fn load(&self, base_dir: &Path) -> Result<Volume> {
        Volume::from_raw_file(&base_dir.join(&self.file), self.grid(), self.coefficients)
    }
}

impl RoiLists {

    pub fn load(&self, grid: &Grid, base_dir: &Path) -> Result<Rois> {
        let set = |specs: &[String]| -> Result<RegionSet> {
            Ok(RegionSet::new(specs.iter()
                              .map(|s| Roi::parse(s, grid, base_dir))
                              .collect::<Result<_>>()?))
        };
        let rois = Rois {
            seed   : set(&self.seed   )?,
            include: set(&self.include)?,
            exclude: set(&self.exclude)?,
            mask   : set(&self.mask   )?,
        };
        if rois.seed.is_empty() { return Err(Error::NoSeedRegions) }
        Ok(rois)
    }
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let config: String = fs::read_to_string(path).map_err(Error::file(path))?;
    Ok(toml::from_str(&config)?)
}

/// Directory against which file names in the config file at `path` are resolved
pub fn base_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
