//! Pfxsrc - command-line tool for particle effect project files

use std::process::ExitCode;

use pfxsrc::cli;

fn main() -> ExitCode {
    cli::run()
}
