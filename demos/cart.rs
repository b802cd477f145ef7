//! Cart Totals Example
//!
//! Loads a cart and a bundle catalog from a fixture set and prints the
//! bundles applied to it.
//!
//! Use `-f` to load a fixture set by name
//! Use `-s` to pick the solver (`greedy` or `ilp`)
//! Use `-a` to price the cart at a different instant
//!
//! Set `RUST_LOG=lattice_bundles=debug` to see why bundles were skipped.

use std::{io, io::Write, time::Instant};

use anyhow::{Result, anyhow};
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::Timestamp;
use tracing_subscriber::EnvFilter;

use lattice_bundles::{
    engine::compute_totals,
    fixtures::Fixture,
    solvers::{greedy::GreedySolver, ilp::ILPSolver},
    utils::{ExampleCartArgs, SolverChoice},
};

/// Cart Totals Example
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .map_err(|error| anyhow!(error))?;

    let args = ExampleCartArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let cart = fixture.cart()?;
    let catalog = fixture.catalog()?;
    let now = args.at.or(fixture.now()).unwrap_or_else(Timestamp::now);

    let start = Instant::now();

    let totals = match args.solver {
        SolverChoice::Greedy => compute_totals::<GreedySolver>(&cart, &catalog, now)?,
        SolverChoice::Ilp => compute_totals::<ILPSolver>(&cart, &catalog, now)?,
    };

    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    totals.write_to(&mut handle)?;

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
