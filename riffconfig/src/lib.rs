//! # RiffBot Configuration Module
//!
//! This module provides configuration management for RiffBot, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Provider crates (`riffspotify`, `rifflavalink`) add their own accessors on
//! top of [`Config`] through extension traits.
//!
//! ## Usage
//!
//! ```no_run
//! use riffconfig::get_config;
//!
//! let config = get_config();
//! let capacity = config.get_registry_capacity()?;
//! let source = config.get_default_search_source();
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

pub mod encryption;

// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("riffbot.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load RiffBot configuration"));
}

const ENV_CONFIG_DIR: &str = "RIFFBOT_CONFIG";
const ENV_PREFIX: &str = "RIFFBOT_CONFIG__";
const CONFIG_DIR_NAME: &str = ".riffbot";

// Default values for configuration
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_SEARCH_SOURCE: &str = "ytmsearch";
const DEFAULT_REGISTRY_CAPACITY: usize = 10_000;
const DEFAULT_REGISTRY_IDLE_SECS: usize = 0;

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            match self.get_value($path) {
                Ok(Value::Number(n)) => Ok(n.as_u64().map(|v| v as usize).unwrap_or($default)),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, size: usize) -> Result<()> {
            let n = Number::from(size);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for RiffBot
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.lock_data().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Write then read permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;
        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `RIFFBOT_CONFIG` environment variable
    /// 3. `.riffbot` in the current directory
    /// 4. `.riffbot` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for
    /// read/write permissions.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Returns the directory holding `config.yaml`
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    fn lock_data(&self) -> std::sync::MutexGuard<'_, Value> {
        // A poisoned lock still holds a consistent YAML tree
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.lock_data();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["queue", "registry", "capacity"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.lock_data();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock_data();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    /// Gets a non-empty string value, or `None`
    pub fn get_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Gets a secret value, transparently decrypting `encrypted:` values
    pub fn get_secret(&self, path: &[&str]) -> Result<Option<String>> {
        match self.get_string(path) {
            Some(value) => encryption::get_password(&value)
                .map(Some)
                .map_err(|e| anyhow!("Failed to decrypt {}: {}", path.join("."), e)),
            None => Ok(None),
        }
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        new_map.insert(Value::String(s.to_lowercase()), Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Gets the minimum log level
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }

    impl_usize_config!(
        get_registry_capacity,
        set_registry_capacity,
        &["queue", "registry", "capacity"],
        DEFAULT_REGISTRY_CAPACITY
    );

    impl_usize_config!(
        get_registry_idle_secs,
        set_registry_idle_secs,
        &["queue", "registry", "idle_secs"],
        DEFAULT_REGISTRY_IDLE_SECS
    );

    /// Gets the search prefix applied to plain-text queries (e.g. `ytmsearch`)
    pub fn get_default_search_source(&self) -> String {
        self.get_string(&["queue", "default_search_source"])
            .map(|s| s.trim_end_matches(':').to_string())
            .unwrap_or_else(|| DEFAULT_SEARCH_SOURCE.to_string())
    }

    pub fn set_default_search_source(&self, source: &str) -> Result<()> {
        self.set_value(
            &["queue", "default_search_source"],
            Value::String(source.to_string()),
        )
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access.
///
/// # Panics
///
/// Panics on first access if the configuration directory cannot be prepared
/// or the configuration file is not valid YAML.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_in(dir: &TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_are_loaded() {
        let dir = TempDir::new().unwrap();
        let config = load_in(&dir);

        assert_eq!(config.get_registry_capacity().unwrap(), 10_000);
        assert_eq!(config.get_registry_idle_secs().unwrap(), 0);
        assert_eq!(config.get_default_search_source(), "ytmsearch");
        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
        assert!(config.get_log_enable_console().unwrap());
        assert!(dir.path().join("config.yaml").exists());
    }

    #[test]
    fn test_user_file_is_merged_over_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "queue:\n  registry:\n    capacity: 42\n",
        )
        .unwrap();

        let config = load_in(&dir);

        assert_eq!(config.get_registry_capacity().unwrap(), 42);
        // untouched keys keep their default
        assert_eq!(config.get_default_search_source(), "ytmsearch");
    }

    #[test]
    fn test_set_value_persists() {
        let dir = TempDir::new().unwrap();
        let config = load_in(&dir);
        config.set_registry_capacity(7).unwrap();
        config.set_default_search_source("scsearch:").unwrap();

        let reloaded = load_in(&dir);
        assert_eq!(reloaded.get_registry_capacity().unwrap(), 7);
        assert_eq!(reloaded.get_default_search_source(), "scsearch");
    }

    #[test]
    fn test_get_value_missing_path() {
        let dir = TempDir::new().unwrap();
        let config = load_in(&dir);
        assert!(config.get_value(&["nope", "missing"]).is_err());
        assert!(config.get_string(&["accounts", "spotify", "client_id"]).is_none());
    }

    #[test]
    fn test_plain_secret_is_returned_as_is() {
        let dir = TempDir::new().unwrap();
        let config = load_in(&dir);
        config
            .set_value(
                &["accounts", "spotify", "client_secret"],
                Value::String("s3cret".into()),
            )
            .unwrap();

        assert_eq!(
            config
                .get_secret(&["accounts", "spotify", "client_secret"])
                .unwrap(),
            Some("s3cret".to_string())
        );
    }

    #[test]
    fn test_env_value_conversion() {
        assert_eq!(Config::convert_env_value("12"), Value::Number(12.into()));
        assert_eq!(Config::convert_env_value("true"), Value::Bool(true));
        assert_eq!(
            Config::convert_env_value("ytsearch"),
            Value::String("ytsearch".into())
        );
    }

    #[test]
    fn test_set_value_internal_creates_intermediate_maps() {
        let mut value = Value::Mapping(Mapping::new());
        Config::set_value_internal(&mut value, &["QUEUE", "registry", "capacity"], Value::Number(3.into()))
            .unwrap();
        let got = Config::get_value_internal(&value, &["queue", "registry", "capacity"]).unwrap();
        assert_eq!(got, Value::Number(3.into()));
    }

    #[test]
    fn test_merge_yaml_replaces_sequences() {
        let mut default: Value = serde_yaml::from_str("a: [1, 2]\nb: {c: 1}").unwrap();
        let external: Value = serde_yaml::from_str("a: [3]\nb: {d: 2}").unwrap();
        merge_yaml(&mut default, &external);

        let expected: Value = serde_yaml::from_str("a: [3]\nb: {c: 1, d: 2}").unwrap();
        assert_eq!(default, expected);
    }
}
