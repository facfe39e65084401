//! Reading input volumes and writing streamlines to disk.

pub mod raw;
pub mod tck;
