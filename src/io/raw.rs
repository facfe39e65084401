//! Headerless volumes of little-endian `f32`s.
//!
//! FOD coefficient volumes and mask volumes are both stored this way, with
//! the x index varying fastest, followed by y, then z and, for multi-valued
//! volumes, the coefficient index varying slowest. The grid itself is
//! described in the configuration file.

use std::fs::File;
use std::io::{Write, Read, BufWriter, BufReader};
use std::path::Path;

use crate::{Error, Result};

pub fn write(data: impl Iterator<Item = f32>, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()
}

type IORes<T> = std::io::Result<T>;

pub fn read<'a>(path: &Path) -> IORes<impl Iterator<Item = IORes<f32>> + 'a> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);
    let mut buffer = [0; 4];

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::UnexpectedEof;
        match buf.read_exact(&mut buffer) {
            Ok(()) => Some(Ok(f32::from_le_bytes(buffer))),
            Err(e) if e.kind() == UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }))
}

/// Read the whole of `path`, insisting that it holds exactly `expected` values
pub fn read_exactly(path: &Path, expected: usize) -> Result<Vec<f32>> {
    let data: Vec<f32> = read(path)
        .and_then(|values| values.collect())
        .map_err(Error::file(path))?;
    if data.len() != expected {
        return Err(Error::SizeMismatch {
            what: path.display().to_string(),
            expected,
            found: data.len(),
        })
    }
    Ok(data)
}
