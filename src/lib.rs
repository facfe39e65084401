//! Probabilistic streamline tractography on fibre orientation distribution
//! (FOD) fields.
//!
//! The engine is organised leaf-first:
//!
//! + [`field`]: sampling the SH coefficients of the FOD at arbitrary positions
//! + [`sh`]: evaluating FOD amplitudes along directions
//! + [`roi`]: seed, include, exclude and mask regions
//! + [`tracking`]: propagation methods, the per-streamline state machine and
//!   the concurrent producer/consumer pipeline that feeds the track writer
//! + [`io`]: raw volumes in, track files out

mod error;
pub use error::{Error, Result};

pub mod types;
pub use types::*;

pub mod grid;
pub mod field;
pub mod sh;
pub mod roi;
pub mod tracking;
pub mod io;
pub mod config;
pub mod utils;
