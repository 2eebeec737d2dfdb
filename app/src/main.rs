use clap::Parser;

use terpdash_lib::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    terpdash_lib::run(Cli::parse()).await
}
