//! Docsync CLI entry point.

use clap::Parser;
use docsync::cli::{self, Cli, EXIT_ERROR};
use docsync::logging::init_logger;

fn main() {
    let cli = Cli::parse();

    init_logger(cli.verbose, cli.quiet, cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
