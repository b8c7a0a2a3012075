//! Config command handlers

use anyhow::{bail, Context, Result};

use shelf_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "catalog_url": config.catalog_url,
                    "views_dir": config.views_path(),
                    "base_path": config.base_path,
                    "search_debounce_ms": config.search_debounce().as_millis() as u64,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:           {}", config.data_dir.display());
            println!("  catalog_url:        {}", config.catalog_url);
            println!("  views_dir:          {}", config.views_path().display());
            println!(
                "  base_path:          {}",
                if config.base_path.is_empty() {
                    "(not set)"
                } else {
                    config.base_path.as_str()
                }
            );
            println!(
                "  search_debounce_ms: {}",
                config.search_debounce().as_millis()
            );
            println!(
                "  log_file:           {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    apply(&mut config, &key, &value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let cleared = value.is_empty() || value == "none";
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "catalog_url" => {
            config.catalog_url = value.to_string();
        }
        "views_dir" => {
            config.views_dir = if cleared { None } else { Some(value.into()) };
        }
        "base_path" => {
            config.base_path = if cleared {
                String::new()
            } else {
                value.to_string()
            };
        }
        "search_debounce_ms" => {
            config.search_debounce_ms = value
                .parse()
                .context("Invalid value for search_debounce_ms. Use a number of milliseconds.")?;
        }
        "log_file" => {
            config.log_file = if cleared { None } else { Some(value.into()) };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, catalog_url, views_dir, base_path, search_debounce_ms, log_file",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "base_path", "/shelf").unwrap();
        apply(&mut config, "search_debounce_ms", "600").unwrap();
        apply(&mut config, "views_dir", "/srv/views").unwrap();

        assert_eq!(config.base_path, "/shelf");
        assert_eq!(config.search_debounce_ms, 600);
        assert_eq!(config.views_path(), std::path::PathBuf::from("/srv/views"));

        apply(&mut config, "views_dir", "none").unwrap();
        assert!(config.views_dir.is_none());
    }

    #[test]
    fn test_apply_rejects_unknown_key() {
        let mut config = Config::default();
        assert!(apply(&mut config, "sync_url", "ws://x").is_err());
        assert!(apply(&mut config, "search_debounce_ms", "soon").is_err());
    }
}
