//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use loopstat_cli::CliError;

#[expect(
    clippy::print_stderr,
    reason = "The binary reports fatal errors on stderr before exiting"
)]
fn main() {
    match loopstat_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("loopstat: {err}");
            std::process::exit(1);
        }
    }
}
