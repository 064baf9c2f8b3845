//! Config command implementation

use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{check_config_file, find_config, save_config, Config, ConfigError, CONFIG_FILE_NAME};
use crate::schema::write_config;

use super::{load_settings, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a config file holding the defaults
    Init {
        /// Where to write it (default: ./config.lua)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config after migration and sanitizing
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute a config subcommand
pub fn run_config(action: ConfigAction, config_path: Option<&Path>) -> ExitCode {
    match action {
        ConfigAction::Init { path, force } => {
            let path = path
                .or_else(|| config_path.map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            run_init(&path, force)
        }
        ConfigAction::Show { json } => run_show(config_path, json),
    }
}

fn run_init(path: &Path, force: bool) -> ExitCode {
    if path.exists() && !force {
        eprintln!("Error: '{}' already exists (use --force to overwrite)", path.display());
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = save_config(path, &Config::default()) {
        eprintln!("Error: Cannot write '{}': {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Created {}", path.display());
    ExitCode::from(EXIT_SUCCESS)
}

fn run_show(config_path: Option<&Path>, json: bool) -> ExitCode {
    let source = config_path.map(Path::to_path_buf).or_else(find_config);
    let config = match load_settings("config", source.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match &source {
        Some(path) => {
            eprintln!("Config: {}", path.display());
            // Values that loading coerced are still worth knowing about
            if let Err(ConfigError::Validation(errors)) = check_config_file(path) {
                for e in errors {
                    eprintln!("Warning: {} (sanitized)", e);
                }
            }
        }
        None => eprintln!("Config: no {} found, using defaults", CONFIG_FILE_NAME),
    }

    if json {
        match serde_json::to_string_pretty(&config) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: Cannot serialize config: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print!("{}", write_config(&config));
    }

    ExitCode::from(EXIT_SUCCESS)
}
