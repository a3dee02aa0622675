use clap::Parser;

use angler_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    angler_cli::logging::init(cli.verbose);
    let code = angler_cli::run(cli).await;
    std::process::exit(code);
}
