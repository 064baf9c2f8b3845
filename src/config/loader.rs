//! Configuration loading and discovery for `config.lua`
//!
//! Provides functions to find, load, check and save the configuration.

use super::schema::Config;
use crate::schema::{read_config, read_config_unsanitized, write_config, SchemaError};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.lua";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Record syntax, field or version error
    #[error("Failed to parse config.lua: {0}")]
    Schema(#[from] SchemaError),
    /// Values the sanitizers would have to change
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Find config.lua by walking up from the current working directory,
/// then falling back to the user config directory.
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find config.lua in the XDG config directory.
///
/// Checks XDG_CONFIG_HOME/pfxsrc/config.lua or ~/.config/pfxsrc/config.lua
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pfxsrc").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find config.lua by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a config.lua file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// [`find_config`] to locate one. When no file is found the defaults are
/// returned. Out-of-range values are sanitized, never rejected.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("editor/config.lua")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(Config::default()),
    }
}

/// Load and sanitize a specific config file
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(read_config(&contents)?)
}

/// Load a config file and fail if any value is outside its valid range
pub fn check_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config = read_config_unsanitized(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Write `config` as the current file version.
///
/// The text goes to a temporary file in the destination directory which
/// is then renamed over `path`, so a failure never leaves a partial file.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    atomic_write(path, write_config(config).as_bytes())?;
    Ok(())
}

/// Replace `path` with `contents` through a temp file and rename
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Resolve a configured path relative to the config file's directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(config_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, text: &str) {
        fs::write(path, text).expect("should write config content");
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("config.lua");
        write(&config_path, "width = 800");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("config.lua");
        write(&config_path, "width = 800");

        let subdir = temp.path().join("projects").join("fire");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, None);
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("config.lua");
        write(&config_path, "config_version = 2\nwidth = 1024\nheight = 768\nculling = false");

        let config = load_config(Some(&config_path)).expect("should load config");
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 768);
        assert!(!config.culling);
        assert_eq!(config.textures_path, "textures/");
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nope.lua")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_syntax_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("config.lua");
        write(&config_path, "width = = 3");

        let err = load_config(Some(&config_path)).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::Syntax(_))));
        assert!(err.to_string().starts_with("Failed to parse config.lua: line 1:"));
    }

    #[test]
    fn test_load_sanitizes_but_check_rejects() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("config.lua");
        write(&config_path, "width = 10\nheight = 10");

        let config = load_config_file(&config_path).expect("should load config");
        assert_eq!((config.width, config.height), (640, 480));

        match check_config_file(&config_path) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("'width'"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("config.lua");
        let mut config = Config::default();
        config.fullscreen = true;
        config.gui_limits.max_delay = 3.5;

        save_config(&config_path, &config).expect("should save config");
        let loaded = load_config(Some(&config_path)).expect("should load config");
        assert_eq!(loaded, config);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/editor");
        assert_eq!(resolve_path(root, Path::new("/abs/tex")), PathBuf::from("/abs/tex"));
        assert_eq!(resolve_path(root, Path::new("textures/")), PathBuf::from("/editor/textures/"));
    }
}
