use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// YouTube Data API keys, one per line. May be empty when keys come from
  /// the environment instead.
  #[serde(default)]
  pub api_keys: String,

  /// Override for the cache database location.
  #[serde(default)]
  pub cache_path: Option<PathBuf>,

  /// Disable the response cache entirely.
  #[serde(default)]
  pub no_cache: bool,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./ytscout.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ytscout/config.yaml
  ///
  /// A missing config file is not an error; keys can still arrive via
  /// `YTSCOUT_API_KEYS`.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("ytscout.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ytscout").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// The raw API key block: config file first, `YTSCOUT_API_KEYS` as a
  /// fallback (commas accepted as separators there).
  pub fn api_key_block(&self) -> Result<String> {
    if !self.api_keys.trim().is_empty() {
      return Ok(self.api_keys.clone());
    }

    std::env::var("YTSCOUT_API_KEYS")
      .map(|raw| raw.replace(',', "\n"))
      .map_err(|_| {
        eyre!(
          "No API keys configured. Add api_keys to ytscout.yaml or set the \
           YTSCOUT_API_KEYS environment variable."
        )
      })
  }
}
