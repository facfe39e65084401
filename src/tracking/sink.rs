//! The single consumer at the end of the pipeline: counts attempts, writes
//! accepted streamlines and decides when enough is enough.

use log::debug;

use super::queue::Reader;
use super::streamline::Streamline;
use crate::Result;

/// Destination of accepted streamlines
pub trait TrackWriter {

    fn append(&mut self, track: &Streamline) -> Result<()>;

    /// Called once, after the last `append`
    fn finish(&mut self, _counts: &Counts) -> Result<()> { Ok(()) }
}

impl TrackWriter for Vec<Streamline> {
    fn append(&mut self, track: &Streamline) -> Result<()> {
        self.push(track.clone());
        Ok(())
    }
}

/// Running totals of a tracking run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    /// Streamlines generated, accepted or not
    pub total: usize,
    /// Streamlines accepted and written
    pub selected: usize,
}

pub struct Sink<'w, W> {
    writer: &'w mut W,
    counts: Counts,
    max_num_tracks: usize,
    max_num_attempts: usize,
}

impl<'w, W: TrackWriter> Sink<'w, W> {

    pub fn new(writer: &'w mut W, max_num_tracks: usize, max_num_attempts: usize) -> Self {
        Self { writer, counts: Counts::default(), max_num_tracks, max_num_attempts }
    }

    pub fn counts(&self) -> Counts { self.counts }

    pub fn done(&self) -> bool {
        self.counts.selected >= self.max_num_tracks || self.counts.total >= self.max_num_attempts
    }

    /// Count `track` and write it if it was accepted. Returns whether more
    /// streamlines are wanted.
    pub fn consume(&mut self, track: &Streamline) -> Result<bool> {
        self.counts.total += 1;
        if !track.is_empty() {
            self.writer.append(track)?;
            self.counts.selected += 1;
        }
        Ok(!self.done())
    }

    /// Consume streamlines until enough have been seen or the producers are
    /// exhausted, reporting progress after each one. Dropping `reader` on
    /// return is what tells the producers to stop.
    pub fn run(mut self, mut reader: Reader<Streamline>, mut report: impl FnMut(&Counts)) -> Result<Counts> {
        if !self.done() {
            while let Some(track) = reader.pop() {
                let more = self.consume(&track)?;
                report(&self.counts);
                if !more { break }
            }
        }
        drop(reader);
        debug!("sink finished: {} of {} streamlines selected", self.counts.selected, self.counts.total);
        self.writer.finish(&self.counts)?;
        Ok(self.counts)
    }
}
