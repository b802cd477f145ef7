//! Utils

use clap::{Parser, ValueEnum};

/// Solver used to choose between overlapping bundles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SolverChoice {
    /// Highest discount first, skipping bundles that overlap earlier picks
    #[default]
    Greedy,

    /// Exact weighted set packing
    Ilp,
}

/// Arguments for the cart examples
#[derive(Debug, Parser)]
pub struct ExampleCartArgs {
    /// Fixture set to use for the cart & bundles
    #[clap(short, long, default_value = "lunch")]
    pub fixture: String,

    /// Solver used to pick the applied bundles
    #[clap(short, long, value_enum, default_value_t = SolverChoice::Greedy)]
    pub solver: SolverChoice,

    /// Price the cart at this instant instead of the fixture's (RFC 3339)
    #[clap(short, long)]
    pub at: Option<jiff::Timestamp>,
}
