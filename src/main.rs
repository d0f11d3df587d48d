use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ytfetch::{cli, logger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = cli::Args::parse();
    logger::init(args.verbosity);

    cli::run(args).await
}
