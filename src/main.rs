//! `mom` binary entry point: parse arguments, set up logging, dispatch.

use clap::Parser;
use mom::cli::Cli;

fn main() {
    let cli = Cli::parse();
    mom::logging::init(cli.verbose);

    let exit_code = mom::cli::run(cli);
    std::process::exit(exit_code);
}
