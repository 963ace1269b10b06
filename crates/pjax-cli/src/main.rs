use clap::Parser;
use pjax_cli::{Cli, logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    run(Cli::parse()).await
}
