use clap::Parser;
use env_logger::Env;

use sipcalc::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    cli::run(Cli::parse()).await
}
