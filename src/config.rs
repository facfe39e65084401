//! Run descriptions read from TOML files.

pub mod track;
