use std::path::PathBuf;

/// Everything that can abort a tracking run.
///
/// Candidates that fail the amplitude test and streamlines that are rejected
/// are *not* errors: they are part of normal operation and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum Error {

    #[error("failed to find suitable seed point after {0} attempts - aborting")]
    SeedExhausted(usize),

    #[error("no seed regions have been specified")]
    NoSeedRegions,

    #[error("invalid initial direction {0:?}: must be a finite, non-zero 3-vector")]
    InvalidInitDirection([f32; 3]),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{what}: expected {expected} values, found {found}")]
    SizeMismatch { what: String, expected: usize, found: usize },

    #[error("{path}: {source}")]
    File { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed track file: {0}")]
    TrackFormat(String),

    #[error("track file encoding: {0}")]
    Binary(#[from] binrw::Error),

    #[error("config file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self { Self::Config(message.into()) }

    /// Attach the offending path to an I/O error
    pub(crate) fn file(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::File { path, source }
    }
}
