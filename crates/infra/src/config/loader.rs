//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `SHELFSIGHT_API_URL` is absent, falls back to loading from file
//! 3. Searches multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SHELFSIGHT_API_URL`: Backend base URL (required)
//! - `SHELFSIGHT_API_METADATA_TIMEOUT`: Listing call timeout in seconds
//! - `SHELFSIGHT_API_MUTATION_TIMEOUT`: Mutation call timeout in seconds
//! - `SHELFSIGHT_POLL_INTERVAL`: Analysis poll interval in seconds
//! - `SHELFSIGHT_JOB_DEADLINE`: Analysis job deadline in seconds
//! - `SHELFSIGHT_DIAGNOSTICS_CAPACITY`: Retained diagnostics entries
//!
//! Unset optional variables keep their [`Config::default`] values.
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./shelfsight.toml`, `./shelfsight.json` (current working directory)
//! 2. `./config.toml`, `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use shelfsight_domain::{Config, Result, ShelfSightError};

const CONFIG_FILE_NAMES: [&str; 4] = ["shelfsight.toml", "shelfsight.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ShelfSightError::Config` if neither the environment nor a config
/// file yields a valid configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ShelfSightError::Config` if `SHELFSIGHT_API_URL` is missing or an
/// optional variable holds an invalid number.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("SHELFSIGHT_API_URL")?;
    if let Some(secs) = env_parse::<u64>("SHELFSIGHT_API_METADATA_TIMEOUT")? {
        config.api.metadata_timeout_secs = secs;
    }
    if let Some(secs) = env_parse::<u64>("SHELFSIGHT_API_MUTATION_TIMEOUT")? {
        config.api.mutation_timeout_secs = secs;
    }
    if let Some(secs) = env_parse::<u64>("SHELFSIGHT_POLL_INTERVAL")? {
        config.analysis.poll_interval_secs = secs;
    }
    if let Some(secs) = env_parse::<u64>("SHELFSIGHT_JOB_DEADLINE")? {
        config.analysis.job_deadline_secs = secs;
    }
    if let Some(capacity) = env_parse::<usize>("SHELFSIGHT_DIAGNOSTICS_CAPACITY")? {
        config.diagnostics.capacity = capacity;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations via
/// [`discover_config_paths`].
///
/// # Errors
/// Returns `ShelfSightError::Config` if the file is missing, unreadable, or
/// not valid JSON/TOML.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ShelfSightError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => discover_config_paths().ok_or_else(|| {
            ShelfSightError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ShelfSightError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| ShelfSightError::Config(format!("Invalid TOML format: {e}"))),
        "json" => {
            serde_json::from_str(contents).map_err(|e| ShelfSightError::Config(format!("Invalid JSON format: {e}")))
        }
        _ => Err(ShelfSightError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// The first existing config file in the standard locations, if any.
pub fn discover_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    search_in(&dirs)
}

fn search_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ShelfSightError::Config(format!("Missing required environment variable: {key}")))
}

/// `Ok(None)` when unset; `Config` error when set but unparseable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ShelfSightError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 6] = [
        "SHELFSIGHT_API_URL",
        "SHELFSIGHT_API_METADATA_TIMEOUT",
        "SHELFSIGHT_API_MUTATION_TIMEOUT",
        "SHELFSIGHT_POLL_INTERVAL",
        "SHELFSIGHT_JOB_DEADLINE",
        "SHELFSIGHT_DIAGNOSTICS_CAPACITY",
    ];

    fn clear_vars() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        std::env::set_var("SHELFSIGHT_API_URL", "http://backend:9000");
        std::env::set_var("SHELFSIGHT_API_METADATA_TIMEOUT", "4");
        std::env::set_var("SHELFSIGHT_API_MUTATION_TIMEOUT", "8");
        std::env::set_var("SHELFSIGHT_POLL_INTERVAL", "1");
        std::env::set_var("SHELFSIGHT_JOB_DEADLINE", "120");
        std::env::set_var("SHELFSIGHT_DIAGNOSTICS_CAPACITY", "50");

        let result = load_from_env();
        clear_vars();

        let config = result.expect("config from env");
        assert_eq!(config.api.base_url, "http://backend:9000");
        assert_eq!(config.api.metadata_timeout_secs, 4);
        assert_eq!(config.api.mutation_timeout_secs, 8);
        assert_eq!(config.analysis.poll_interval_secs, 1);
        assert_eq!(config.analysis.job_deadline_secs, 120);
        assert_eq!(config.diagnostics.capacity, 50);
    }

    #[test]
    fn test_load_from_env_optional_vars_default() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        std::env::set_var("SHELFSIGHT_API_URL", "http://backend:9000");
        let result = load_from_env();
        clear_vars();

        let config = result.expect("config from env");
        assert_eq!(config.analysis, Config::default().analysis);
        assert_eq!(config.api.mutation_timeout_secs, 15);
    }

    #[test]
    fn test_load_from_env_missing_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ShelfSightError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        std::env::set_var("SHELFSIGHT_API_URL", "http://backend:9000");
        std::env::set_var("SHELFSIGHT_POLL_INTERVAL", "soon");
        let result = load_from_env();
        clear_vars();

        match result {
            Err(ShelfSightError::Config(message)) => assert!(message.contains("SHELFSIGHT_POLL_INTERVAL")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[api]
base_url = "http://file-backend:8000"

[upload]
max_bytes = 1048576
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.expect("config from TOML");
        assert_eq!(config.api.base_url, "http://file-backend:8000");
        assert_eq!(config.upload.max_bytes, 1_048_576);
        assert_eq!(config.analysis.job_deadline_secs, 600);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/shelfsight.json"))).unwrap_err();
        assert!(matches!(err, ShelfSightError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_parse_config_json() {
        let path = PathBuf::from("shelfsight.json");
        let config = parse_config(r#"{"analysis": {"poll_interval_secs": 5}}"#, &path).expect("valid JSON");
        assert_eq!(config.analysis.poll_interval_secs, 5);
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let path = PathBuf::from("shelfsight.json");
        assert!(parse_config(r#"{ "api": "#, &path).is_err());
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let path = PathBuf::from("shelfsight.yaml");
        assert!(parse_config("api: {}", &path).is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn search_prefers_shelfsight_over_generic_names() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("shelfsight.json"), "{}").unwrap();

        let found = search_in(&[dir.path().to_path_buf()]).expect("a config file");
        assert_eq!(found.file_name().and_then(|n| n.to_str()), Some("shelfsight.json"));
    }

    #[test]
    fn search_returns_none_for_empty_dirs() {
        let dir = TempDir::new().unwrap();
        assert!(search_in(&[dir.path().to_path_buf()]).is_none());
    }
}
