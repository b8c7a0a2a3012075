//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/shelf/config.toml)
//! 3. Environment variables (SHELF_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "SHELF";

/// Default catalog endpoint (BnF SRU, UNIMARC records)
pub const DEFAULT_CATALOG_URL: &str = "https://catalogue.bnf.fr/api/SRU";

/// Bounds of the search-as-you-type quiescence window, in milliseconds
pub const MIN_DEBOUNCE_MS: u64 = 500;
pub const MAX_DEBOUNCE_MS: u64 = 750;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite database, logs)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bibliographic catalog endpoint
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Directory holding view markup for the router
    #[serde(default)]
    pub views_dir: Option<PathBuf>,

    /// Path prefix stripped before route resolution (e.g. "/shelf")
    #[serde(default)]
    pub base_path: String,

    /// Quiescence window for search suggestions
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Log file location (defaults to {data_dir}/debug.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_url: default_catalog_url(),
            views_dir: None,
            base_path: String::new(),
            search_debounce_ms: default_debounce_ms(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SHELF_DATA_DIR, SHELF_CATALOG_URL, SHELF_VIEWS_DIR,
    ///    SHELF_BASE_PATH, SHELF_SEARCH_DEBOUNCE_MS, SHELF_LOG_FILE)
    /// 2. Config file (~/.config/shelf/config.toml or SHELF_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_CATALOG_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.catalog_url = val;
            }
        }

        // Empty string clears it
        if let Ok(val) = std::env::var(format!("{}_VIEWS_DIR", ENV_PREFIX)) {
            self.views_dir = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        if let Ok(val) = std::env::var(format!("{}_BASE_PATH", ENV_PREFIX)) {
            self.base_path = val;
        }

        // Unparseable values are ignored
        if let Ok(val) = std::env::var(format!("{}_SEARCH_DEBOUNCE_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.trim().parse() {
                self.search_debounce_ms = ms;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SHELF_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shelf")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("shelf.db")
    }

    /// Get the directory view markup is read from
    pub fn views_path(&self) -> PathBuf {
        self.views_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("views"))
    }

    /// Search debounce window, clamped to the supported range
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(
            self.search_debounce_ms
                .clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS),
        )
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelf")
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    MIN_DEBOUNCE_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "SHELF_DATA_DIR",
        "SHELF_CATALOG_URL",
        "SHELF_VIEWS_DIR",
        "SHELF_BASE_PATH",
        "SHELF_SEARCH_DEBOUNCE_MS",
        "SHELF_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert!(config.views_dir.is_none());
        assert!(config.base_path.is_empty());
        assert!(config.data_dir.ends_with("shelf"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.database_path().ends_with("shelf.db"));
        assert!(config.views_path().ends_with("views"));
    }

    #[test]
    fn test_search_debounce_is_clamped() {
        let mut config = Config::default();
        assert_eq!(config.search_debounce(), Duration::from_millis(500));

        config.search_debounce_ms = 100;
        assert_eq!(config.search_debounce(), Duration::from_millis(500));

        config.search_debounce_ms = 5_000;
        assert_eq!(config.search_debounce(), Duration::from_millis(750));

        config.search_debounce_ms = 600;
        assert_eq!(config.search_debounce(), Duration::from_millis(600));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHELF_DATA_DIR", "/tmp/shelf-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/shelf-test"));
    }

    #[test]
    fn test_env_override_views_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHELF_VIEWS_DIR", "/srv/views");
        config.apply_env_overrides();
        assert_eq!(config.views_dir, Some(PathBuf::from("/srv/views")));

        env::set_var("SHELF_VIEWS_DIR", "");
        config.apply_env_overrides();
        assert!(config.views_dir.is_none());
    }

    #[test]
    fn test_env_override_catalog_url_ignores_empty() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHELF_CATALOG_URL", "");
        config.apply_env_overrides();
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);

        env::set_var("SHELF_CATALOG_URL", "http://localhost:8080/sru");
        config.apply_env_overrides();
        assert_eq!(config.catalog_url, "http://localhost:8080/sru");
    }

    #[test]
    fn test_env_override_debounce_ignores_garbage() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHELF_SEARCH_DEBOUNCE_MS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.search_debounce_ms, MIN_DEBOUNCE_MS);

        env::set_var("SHELF_SEARCH_DEBOUNCE_MS", "700");
        config.apply_env_overrides();
        assert_eq!(config.search_debounce(), Duration::from_millis(700));
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/shelf"),
            catalog_url: "http://catalog.test/sru".to_string(),
            views_dir: Some(PathBuf::from("/data/views")),
            base_path: "/MBL".to_string(),
            search_debounce_ms: 600,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("catalog_url"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.base_path, "/MBL");
        assert_eq!(parsed.search_debounce_ms, 600);
    }

    #[test]
    fn test_load_from_str_fills_defaults() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(r#"data_dir = "/custom/data""#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.search_debounce_ms, MIN_DEBOUNCE_MS);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp = tempfile::TempDir::new().unwrap();
        env::set_var("SHELF_DATA_DIR", temp.path());

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.data_dir, temp.path());
        assert!(config.views_dir.is_none());
    }
}
