//! Running the whole pipeline: several builder threads feeding one sink
//! through a bounded queue.

use std::num::NonZeroUsize;

use log::{debug, info, warn};

use super::builder::StreamlineBuilder;
use super::ifod1::Ifod1;
use super::ifod2::Ifod2;
use super::method::{Method, SeedSource, State};
use super::params::{Algorithm, Parameters};
use super::queue::{self, Writer, DEFAULT_CAPACITY};
use super::sdstream::SdStream;
use super::sink::{Counts, Sink, TrackWriter};
use super::streamline::Streamline;
use crate::field::FieldSampler;
use crate::roi::Rois;
use crate::sh::Amplitude;
use crate::Result;

/// How a run is executed, as opposed to what it computes
#[derive(Debug)]
pub struct RunOptions {
    /// Number of streamline-generating threads
    pub threads: usize,
    pub queue_capacity: usize,
    pub seeds: SeedSource,
}

impl RunOptions {

    /// Unspecified options default to one thread per core, a queue of
    /// `DEFAULT_CAPACITY` and seeds taken from the clock
    pub fn new(threads: Option<usize>, queue_capacity: Option<usize>, seed: Option<u64>) -> Self {
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            threads: threads.unwrap_or(cores).max(1),
            queue_capacity: queue_capacity.unwrap_or(DEFAULT_CAPACITY),
            seeds: seed.map_or_else(SeedSource::from_clock, SeedSource::fixed),
        }
    }
}

/// Generate streamlines with the method chosen in `params`, until enough have
/// been selected or attempted, writing accepted ones to `writer`.
///
/// Each builder thread gets its own field sampler from `make_sampler`.
/// `report` is called from the calling thread after each streamline is
/// counted.
pub fn track<S, F, W>(
    params      : &Parameters,
    rois        : &Rois,
    make_sampler: F,
    writer      : &mut W,
    options     : &RunOptions,
    report      : impl FnMut(&Counts),
) -> Result<Counts>
where
    S: FieldSampler,
    F: Fn() -> S + Sync,
    W: TrackWriter,
{
    info!("{} tracking with {} threads: {} streamlines requested, at most {} attempts",
          params.algorithm.name(), options.threads, params.max_num_tracks, params.max_num_attempts);
    macro_rules! go { ($method:path) => { run(params, rois, &make_sampler, $method, writer, options, report) }; }
    let counts = match params.algorithm {
        Algorithm::Ifod1    => go!(Ifod1::new),
        Algorithm::Ifod2    => go!(Ifod2::new),
        Algorithm::SdStream => go!(SdStream::new),
    }?;
    info!("{} of {} streamlines selected", counts.selected, counts.total);
    Ok(counts)
}

/// `track` with an explicit method constructor
pub fn run<'p, S, F, N, M, W>(
    params      : &'p Parameters,
    rois        : &'p Rois,
    make_sampler: &F,
    make_method : N,
    writer      : &mut W,
    options     : &RunOptions,
    report      : impl FnMut(&Counts),
) -> Result<Counts>
where
    S: FieldSampler,
    F: Fn() -> S + Sync,
    N: Fn(State<'p, S>) -> M + Sync,
    M: Method,
    W: TrackWriter,
{
    // Build the shared Legendre table once; each thread clones the evaluator
    let amplitude = Amplitude::new(make_sampler().n_values(), params.precomputed)?;
    // Register every producer and the consumer before any thread starts
    let (producer, reader) = queue::bounded(options.queue_capacity);
    let producers = vec![producer; options.threads];
    let make_method = &make_method;

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(producers.len());
        for (i, producer) in producers.into_iter().enumerate() {
            let amplitude = amplitude.clone();
            let (state_seed, builder_seed) = (options.seeds.next(), options.seeds.next());
            let handle = std::thread::Builder::new()
                .name(format!("tracker-{i}"))
                .spawn_scoped(scope, move || {
                    let state = State::new(params, make_sampler(), amplitude, state_seed);
                    let builder = StreamlineBuilder::new(make_method(state), params, rois, builder_seed);
                    produce(builder, producer)
                })?;
            handles.push(handle);
        }

        let sink = Sink::new(writer, params.max_num_tracks, params.max_num_attempts);
        let counts = sink.run(reader, report);

        let mut failure = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => { failure.get_or_insert(e); }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        let counts = counts?;
        match failure {
            Some(e) => {
                warn!("tracking aborted after {} of {} streamlines: {e}", counts.selected, counts.total);
                Err(e)
            }
            None => Ok(counts),
        }
    })
}

/// Builder thread body: generate until the sink stops listening. A fatal error
/// aborts the whole pipeline.
fn produce<M: Method>(mut builder: StreamlineBuilder<'_, M>, mut queue: Writer<Streamline>) -> Result<()> {
    let mut generated = 0_usize;
    loop {
        let track = match builder.generate() {
            Ok(track) => track,
            Err(e) => {
                queue.abort();
                return Err(e)
            }
        };
        if queue.push(track).is_err() { break }
        generated += 1;
    }
    debug!("{}: {generated} streamlines delivered",
           std::thread::current().name().unwrap_or("tracker"));
    Ok(())
}
