//! MRtrix `.tck` track files.
//!
//! A text header of `key: value` lines, opened by `mrtrix tracks` and closed
//! by `END`, followed at byte offset `file: . OFFSET` by little-endian `f32`
//! point triplets. Each streamline ends with a NaN triplet, the file with an
//! Inf triplet. `count` and `total_count` are written as zero-padded
//! placeholders and filled in once the run is over.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use binrw::{binrw, BinReaderExt, BinWrite};
use itertools::Itertools;

use crate::tracking::{Counts, Streamline, TrackWriter};
use crate::{Error, Point, Result};

const MAGIC: &str = "mrtrix tracks";
const DATATYPE: &str = "Float32LE";
/// Width of the patched count fields
const COUNT_WIDTH: usize = 10;
/// Keys managed by the writer itself
const RESERVED: [&str; 4] = ["datatype", "count", "total_count", "file"];

#[binrw]
#[brw(little)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Triplet { x: f32, y: f32, z: f32 }

impl Triplet {
    const SEPARATOR : Self = Self { x: f32::NAN,      y: f32::NAN,      z: f32::NAN      };
    const TERMINATOR: Self = Self { x: f32::INFINITY, y: f32::INFINITY, z: f32::INFINITY };
}

impl From<&Point> for Triplet {
    fn from(p: &Point) -> Self { Self { x: p.x, y: p.y, z: p.z } }
}

pub struct TckWriter<W: Write + Seek> {
    out: W,
    count: usize,
    /// Byte offsets of the `count` and `total_count` placeholders
    count_at: u64,
    total_at: u64,
}

impl TckWriter<BufWriter<File>> {
    pub fn create(path: &Path, properties: &[(String, String)]) -> Result<Self> {
        let file = File::create(path).map_err(Error::file(path))?;
        Self::new(BufWriter::new(file), properties)
    }
}

impl<W: Write + Seek> TckWriter<W> {

    /// Write the header, with `properties` in the order given
    pub fn new(mut out: W, properties: &[(String, String)]) -> Result<Self> {
        let start = out.stream_position()?;
        let user = properties.iter()
            .filter(|(k, _)| !RESERVED.contains(&k.as_str()))
            .map(|(k, v)| format!("{k}: {v}\n"))
            .join("");
        let placeholder = format!("{:0w$}", 0, w = COUNT_WIDTH);
        let head = format!("{MAGIC}\n{user}datatype: {DATATYPE}\ncount: {placeholder}\ntotal_count: {placeholder}\n");
        let count_at = start + (head.len() - "\ntotal_count: \n".len() - 2 * COUNT_WIDTH) as u64;
        let total_at = start + (head.len() - COUNT_WIDTH - 1) as u64;

        // The offset line counts its own digits
        let mut offset = 0;
        let header = loop {
            let header = format!("{head}file: . {offset}\nEND\n");
            if header.len() == offset { break header }
            offset = header.len();
        };
        out.write_all(header.as_bytes())?;
        Ok(Self { out, count: 0, count_at, total_at })
    }

    /// The underlying stream
    pub fn into_inner(self) -> W { self.out }

    fn write_count(&mut self, at: u64, n: usize) -> Result<()> {
        self.out.seek(SeekFrom::Start(at))?;
        write!(self.out, "{:0w$}", n, w = COUNT_WIDTH)?;
        Ok(())
    }
}

impl<W: Write + Seek> TrackWriter for TckWriter<W> {

    fn append(&mut self, track: &Streamline) -> Result<()> {
        for p in track.points() {
            Triplet::from(p).write(&mut self.out)?;
        }
        Triplet::SEPARATOR.write(&mut self.out)?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self, counts: &Counts) -> Result<()> {
        Triplet::TERMINATOR.write(&mut self.out)?;
        let end = self.out.stream_position()?;
        self.write_count(self.count_at, self.count)?;
        self.write_count(self.total_at, counts.total)?;
        self.out.seek(SeekFrom::Start(end))?;
        self.out.flush()?;
        Ok(())
    }
}

/// Contents of a track file
#[derive(Debug, Default)]
pub struct TckFile {
    /// Every header entry, including `count` and `total_count`
    pub properties: BTreeMap<String, String>,
    pub tracks: Vec<Vec<Point>>,
}

impl TckFile {
    pub fn count(&self) -> Option<usize> {
        self.properties.get("count")?.trim().parse().ok()
    }
}

pub fn read_tck(path: &Path) -> Result<TckFile> {
    let file = File::open(path).map_err(Error::file(path))?;
    read(BufReader::new(file))
}

pub fn read<R: BufRead + Seek>(mut r: R) -> Result<TckFile> {
    let bad = |what: &str| Error::TrackFormat(what.into());
    let mut line = String::new();
    r.read_line(&mut line)?;
    if line.trim_end() != MAGIC { return Err(bad("missing 'mrtrix tracks' magic line")) }

    let mut properties = BTreeMap::new();
    loop {
        line.clear();
        if r.read_line(&mut line)? == 0 { return Err(bad("header ends without END")) }
        let entry = line.trim_end();
        if entry == "END" { break }
        let (key, value) = entry.split_once(':').ok_or_else(|| bad(entry))?;
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }

    match properties.get("datatype").map(String::as_str) {
        Some(DATATYPE) => {}
        other => return Err(Error::TrackFormat(format!("unsupported datatype {other:?}"))),
    }
    let offset = properties.get("file")
        .and_then(|f| f.strip_prefix(". "))
        .and_then(|n| n.trim().parse::<u64>().ok())
        .ok_or_else(|| bad("missing or malformed 'file' entry"))?;
    r.seek(SeekFrom::Start(offset))?;

    let mut tracks = vec![];
    let mut current = vec![];
    loop {
        let t = match r.read_le::<Triplet>() {
            Ok(t) => t,
            // Files from interrupted runs lack the terminator
            Err(binrw::Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if t.x.is_nan()      { tracks.push(std::mem::take(&mut current)); continue }
        if t.x.is_infinite() { break }
        current.push(Point::new(t.x, t.y, t.z));
    }
    Ok(TckFile { properties, tracks })
}
