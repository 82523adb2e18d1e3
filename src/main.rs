mod cli;
mod config;
mod fetchers;
mod services;
mod types;

use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.run()
}
