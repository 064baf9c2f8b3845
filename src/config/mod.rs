//! Editor configuration
//!
//! Types and defaults for `config.lua`, plus discovery and loading. The
//! on-disk format and its version migrations live in [`crate::schema`].

pub mod loader;
pub mod schema;

pub use loader::{
    check_config_file, find_config, find_config_from, load_config, load_config_file, resolve_path,
    save_config, ConfigError, CONFIG_FILE_NAME,
};
pub use schema::*;
