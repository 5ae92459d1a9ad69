// These Clippy lints are disabled because this is a CLI binary, not a library:
// - print_stdout/print_stderr: CLI tools are expected to print to stdout/stderr for user output.
// - exit: Calling `std::process::exit()` is standard for CLI apps to signal failure to the shell.
#![allow(clippy::print_stdout, clippy::print_stderr, clippy::exit)]

use clap::Parser;

use pubcheck_cli::cli::{self, Cli, EXIT_FINDINGS, EXIT_USAGE};
use pubcheck_cli::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    match cli::run(&cli, &mut stdout) {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FINDINGS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_USAGE);
        }
    }
}
