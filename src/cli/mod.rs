//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod config;
mod show;
mod validate;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glob::glob;

use crate::affector::Channel;
use crate::telemetry::{self, ErrorEntry};

pub use config::ConfigAction;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Check if a path has the record file extension (.lua).
pub fn is_record_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("lua"))
}

/// Find all record files in a directory (recursively).
pub fn find_record_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(paths) = glob(&format!("{}/**/*.lua", dir.display())) {
        files.extend(paths.filter_map(Result::ok));
    }
    files.sort();
    files
}

/// Replace every directory argument with the record files below it
pub(crate) fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(find_record_files(input));
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Load the editor config named by `--config`, or discover one.
///
/// Failures are reported on stderr and turned into the exit code.
pub(crate) fn load_settings(command: &str, path: Option<&Path>) -> Result<crate::config::Config, ExitCode> {
    crate::config::load_config(path).map_err(|e| {
        eprintln!("Error: {}", e);
        let mut entry = ErrorEntry::new(command, "config_error", e.to_string());
        if let Some(p) = path {
            entry = entry.with_file(p.display().to_string());
        }
        telemetry::log_error(&entry);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Pfxsrc - particle effect project tooling
#[derive(Parser)]
#[command(name = "pfx")]
#[command(about = "Pfxsrc - validate, upgrade and inspect particle effect projects (.lua)")]
#[command(version)]
pub struct Cli {
    /// Editor config file (default: discover config.lua from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append failures as JSON lines to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub collect_errors: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upgrade project and config files to the newest version and canonical layout
    Fmt {
        /// Input file(s) or directories to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Check formatting without writing (exit 1 if changes needed)
        #[arg(long)]
        check: bool,

        /// Write to stdout instead of in-place
        #[arg(long)]
        stdout: bool,
    },

    /// Validate project and config files
    Validate {
        /// Files or directories to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize the particle systems in a project
    Show {
        /// Project file
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sample one affector channel of a particle system over its lifetime
    Plot {
        /// Project file
        file: PathBuf,

        /// Particle system index (0-based)
        #[arg(long, default_value = "0")]
        system: usize,

        /// Channel to sample: color, size, rotation, position, velocity
        #[arg(long)]
        channel: Channel,

        /// Number of evenly spaced ages to sample, including 0 and 1
        #[arg(long, default_value = "11")]
        points: usize,
    },

    /// Create or inspect the editor config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Entry point for the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.collect_errors {
        telemetry::init_collector(path, true);
    }

    match cli.command {
        Commands::Fmt { files, check, stdout } => validate::run_fmt(&files, check, stdout),
        Commands::Validate { files, strict, json } => {
            validate::run_validate(&files, cli.config.as_deref(), strict, json)
        }
        Commands::Show { file, json } => show::run_show(&file, json),
        Commands::Plot { file, system, channel, points } => {
            show::run_plot(&file, system, channel, points)
        }
        Commands::Config { action } => config::run_config(action, cli.config.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plot_channel() {
        let cli = Cli::parse_from(["pfx", "plot", "fire.lua", "--channel", "size", "--system", "2"]);
        match cli.command {
            Commands::Plot { system, channel, points, .. } => {
                assert_eq!(system, 2);
                assert_eq!(channel, Channel::Size);
                assert_eq!(points, 11);
            }
            _ => panic!("expected plot command"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["pfx", "validate", "a.lua", "--config", "cfg/config.lua"]);
        assert_eq!(cli.config, Some(PathBuf::from("cfg/config.lua")));
    }

    #[test]
    fn test_is_record_file() {
        assert!(is_record_file(Path::new("fire.lua")));
        assert!(!is_record_file(Path::new("fire.png")));
        assert!(!is_record_file(Path::new("lua")));
    }

    #[test]
    fn test_expand_inputs() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("effects");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.lua"), "").unwrap();
        fs::write(temp.path().join("a.lua"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let loose = PathBuf::from("missing.lua");
        let files = expand_inputs(&[temp.path().to_path_buf(), loose.clone()]);
        assert_eq!(files, vec![temp.path().join("a.lua"), nested.join("b.lua"), loose]);
    }
}
