/// Command line interface for `tckgen` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "tckgen",
    about = "Generate streamlines from a fibre orientation distribution field",
)]
pub (super) struct Cli {
    /// TOML file describing the field, the regions and the tracking options
    pub config: PathBuf,

    /// Output track file (MRtrix .tck)
    #[clap(short, long)]
    pub out: PathBuf,

    /// Propagation method, overriding the config file
    #[clap(short, long, value_enum)]
    pub algorithm: Option<Algorithm>,

    /// Number of streamlines to select
    #[clap(short, long)]
    pub number: Option<usize>,

    /// Number of streamlines to generate before giving up
    #[clap(long)]
    pub max_attempts: Option<usize>,

    /// Number of streamline-generating threads [default: one per core]
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,

    /// Track only forwards from the seed
    #[clap(short, long)]
    pub unidirectional: bool,

    /// Fixed base seed for reproducible runs
    #[clap(long)]
    pub seed: Option<u64>,
}

impl Cli {

    /// Let command line options take precedence over the config file
    pub (super) fn apply(&self, t: &mut Tracking) {
        if self.algorithm   .is_some() { t.algorithm    = self.algorithm    }
        if self.number      .is_some() { t.number       = self.number       }
        if self.max_attempts.is_some() { t.max_attempts = self.max_attempts }
        if self.threads     .is_some() { t.threads      = self.threads      }
        if self.seed        .is_some() { t.seed         = self.seed         }
        t.unidirectional |= self.unidirectional;
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
use fodtrack::{config::track::Tracking, tracking::Algorithm};
