use anyhow::Result;
use clap::Parser;
use pocketbank::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run().await
}
