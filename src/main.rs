use clap::Parser;
use janitor::cli::{self, Cli};
use janitor::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    if let Err(e) = cli::run(&cli) {
        OutputFormatter::error(&format!("Error: {:#}", e));
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
