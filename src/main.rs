use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use parlife::{Config, Engine, Grid, MAX_PRINTABLE_GRID, report};

fn main() -> ExitCode {
    let config = match Config::try_parse_filtered(std::env::args()) {
        Ok(config) => config,
        Err(err) if err.kind() == clap::error::ErrorKind::DisplayHelp => {
            print!("{err}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let workers = config.workers();
    let seed = config.resolved_seed();

    // Initialization: build the grid from the input file or from the
    // seeded RNG, and make the halo of generation 0 well-formed.
    let init_started = Instant::now();
    let grid = match &config.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open input file {}", path.display()))?;
            Grid::load_from_ascii(BufReader::new(file))
                .with_context(|| format!("cannot parse input file {}", path.display()))?
        }
        None => {
            let grid = Grid::new(config.height, config.width)?;
            grid.random_fill(seed);
            grid
        }
    };
    grid.copy_border();
    report::print_time("initialization phase", init_started.elapsed());

    println!(
        "Width: {}, Height: {}, Steps: {}, Workers: {}, Sync: {}, Seed: {}{}.",
        grid.width(),
        grid.height(),
        config.steps,
        workers,
        config.sync,
        seed,
        config
            .input
            .as_ref()
            .map(|path| format!(", Input: {}", path.display()))
            .unwrap_or_default(),
    );

    if small_enough_to_print(&grid) {
        grid.print("INPUT");
    }

    let engine = Engine::new(config.steps, workers, config.sync)
        .with_grain(config.grain)
        .with_tasks(config.num_tasks())
        .with_blocked_kernel(config.vect);
    let run_report = engine.run(&grid);

    if run_report.workers > 1 {
        report::print_time("creating threads", run_report.spawn);
        report::print_time("barrier phase", run_report.sync_phase);
    }
    report::print_time("serial phase", run_report.serial_phase);
    report::print_time("complete Game of Life", run_report.total);

    if small_enough_to_print(&grid) {
        grid.print("OUTPUT");
    }
    Ok(())
}

fn small_enough_to_print(grid: &Grid) -> bool {
    cfg!(debug_assertions) && grid.height() <= MAX_PRINTABLE_GRID && grid.width() <= MAX_PRINTABLE_GRID
}
