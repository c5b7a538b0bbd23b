//! fan-cli - Flood alert notifier command line tool.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fan-cli",
    version,
    about = "Flood alert notifier toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: fan_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    fan_cmd::run(cli.command)
}
