//! Rollchart CLI - synthesize blue/green rollout manifests from a JSON config

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "rollchart")]
#[command(author = "Rollchart Contributors")]
#[command(version)]
#[command(
    about = "Synthesize blue/green Argo Rollout manifests from a JSON config",
    long_about = None
)]
struct Cli {
    /// Chart config file (JSON)
    #[arg(long)]
    config: PathBuf,
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let output_dir = commands::synth::output_dir();

    if let Err(err) = commands::synth::run(&cli.config, &output_dir) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
