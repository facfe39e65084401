mod cli;
mod progress;

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("tckgen: {e}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = read_config_file(&args.config)?;
    let base = base_dir(&args.config);
    args.apply(&mut config.tracking);
    let params = Parameters::new(&config.tracking)?;

    // Before starting the potentially long computation, make sure that we can
    // write the result to the requested destination.
    if let Some(dir) = args.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut writer = TckWriter::create(&args.out, &params.properties())?;

    let mut timing = timing::Progress::new();
    timing.start(&format!("Loading FOD field from {}", base.join(&config.field.file).display()));
    let field = config.field.load(&base)?;
    timing.done();
    timing.start("Loading regions of interest");
    let rois = config.roi.load(&field.grid, &base)?;
    timing.done();

    let t = &config.tracking;
    let options = RunOptions::new(t.threads, t.queue_capacity, t.seed);
    println!("{}: {} streamlines, {} threads, writing to {}",
             params.algorithm.name(), group_digits(params.max_num_tracks), options.threads, args.out.display());

    let progress = Progress::new(params.max_num_tracks);
    let counts = track(&params, &rois, || field.sampler(), &mut writer, &options, |c| progress.update(c))?;
    progress.finish(&counts);

    if counts.selected < params.max_num_tracks {
        println!("Only {} of {} requested streamlines were selected, after {} attempts",
                 group_digits(counts.selected), group_digits(params.max_num_tracks), group_digits(counts.total));
    }
    Ok(())
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::fs::create_dir_all;
use clap::Parser;
use fodtrack::{
    config::track::{base_dir, read_config_file},
    io::tck::TckWriter,
    tracking::{track, Parameters, RunOptions},
    utils::{group_digits, timing},
};
use cli::Cli;
use progress::Progress;
