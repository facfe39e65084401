//! Streamline generation.
//!
//! Several builder threads each run a propagation [`Method`] from random seed
//! points, applying the region logic in [`builder`], and push the resulting
//! streamlines (empty if rejected) through a bounded [`queue`] to a single
//! [`sink`], which writes the accepted ones and decides when to stop.

pub mod params;
pub mod method;
pub mod ifod1;
pub mod ifod2;
pub mod sdstream;
pub mod streamline;
pub mod builder;
pub mod queue;
pub mod sink;
pub mod exec;

pub use params::{Algorithm, Parameters};
pub use method::{Method, SeedSource, State};
pub use streamline::Streamline;
pub use builder::StreamlineBuilder;
pub use sink::{Counts, Sink, TrackWriter};
pub use exec::{run, track, RunOptions};
