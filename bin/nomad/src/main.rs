//! Nomad reputation engine binary.

mod cli;
mod config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    cli::run().await
}
