//! RSO CLI - Command line tool for reservoir storage simulation.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "rso-cli",
    version,
    about = "Reservoir storage and operating policy toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: rso_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    rso_cmd::run(cli.command)
}
