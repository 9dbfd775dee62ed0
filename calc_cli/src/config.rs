//! Configuration management for matcalc
//!
//! Config stored at: ~/.config/matcalc/config.json

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

const APP_DIR: &str = "matcalc";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog file override
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Symbol printed before costs
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Name recorded in the catalog lock file
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            output_format: OutputFormat::default(),
            currency_symbol: default_currency_symbol(),
            user_id: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine the config directory"))?
            .join(APP_DIR);
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Catalog file to open
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }

        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine the data directory"))?
            .join(APP_DIR);
        Ok(dir.join("catalog.json"))
    }

    /// Name for the lock file, falling back to the login name
    pub fn user_id(&self) -> String {
        self.user_id
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "matcalc".to_string())
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config =
                serde_json::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Set one value by key. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "store_path" => {
                self.store_path = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "output_format" => {
                self.output_format = match value.to_ascii_lowercase().as_str() {
                    "table" => OutputFormat::Table,
                    "json" => OutputFormat::Json,
                    other => bail!("Unknown output format '{other}' (expected table or json)"),
                };
            }
            "currency_symbol" => {
                self.currency_symbol = value.to_string();
            }
            "user_id" => {
                self.user_id = (!value.is_empty()).then(|| value.to_string());
            }
            other => bail!("Unknown config key '{other}'"),
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matcalc Configuration")?;
        writeln!(f, "=====================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Store path:      {}",
            self.store_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:   {}", self.output_format)?;
        writeln!(f, "Currency symbol: {}", self.currency_symbol)?;
        writeln!(f, "User id:         {}", self.user_id.as_deref().unwrap_or("(login name)"))?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:     {}", path.display())?;
        }

        Ok(())
    }
}
