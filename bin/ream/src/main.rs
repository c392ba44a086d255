use std::process;

use clap::Parser;
use ream::{
    cli::{Cli, Commands},
    genesis::run_genesis,
    transition::run_transition,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let verbosity = match &cli.command {
        Commands::Transition(config) => config.verbosity,
        Commands::Genesis(config) => config.verbosity,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(verbosity.directive()))
        .init();

    let result = match &cli.command {
        Commands::Transition(config) => run_transition(config),
        Commands::Genesis(config) => run_genesis(config),
    };

    if let Err(err) = result {
        error!("{err:#}");
        process::exit(1);
    }
}
