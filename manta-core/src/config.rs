//! src/config.rs
//! ============================================================================
//! # Config: user-editable settings for the traversal core
//!
//! Loads and saves settings as TOML from the proper cross-platform config
//! path using the [`directories`](https://docs.rs/directories) crate.
//!
//! - XDG-compliant config discovery and writing (Linux, macOS, Windows)
//! - Robust defaulting if no config file exists
//! - Async load/save for smooth integration with Tokio

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::info;

/// Modified-time cache settings.
///
/// The cache is unbounded by default — an accepted limitation inherited
/// from the front end's `localStorage` record. Both bounds are opt-in
/// because they change observable behavior (stale entries disappearing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Disable to skip enrichment entirely.
    pub enabled: bool,

    /// Maximum number of cached directory paths; oldest values evicted.
    pub max_entries: Option<usize>,

    /// Drop entries older than this at load time.
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: None,
            ttl: None,
        }
    }
}

/// Traversal tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Yield to the scheduler after this many worklist steps so a long
    /// expansion never starves co-resident tasks.
    pub yield_every: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self { yield_every: 64 }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub traversal: TraversalConfig,
}

impl Config {
    /// Loads config from the TOML file at the XDG-compliant app config dir,
    /// or writes and returns defaults when none exists yet.
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(&path).await?;
            let cfg: Self = toml::from_str(&text)?;

            Ok(cfg)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;

            Ok(default_config)
        }
    }

    /// Saves config to the TOML file at the XDG-compliant app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(&path, toml_str).await?;

        Ok(())
    }

    /// Canonical config file path via `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "manta", "Manta")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert!(parsed.cache.enabled);
        assert_eq!(parsed.cache.max_entries, None);
        assert_eq!(parsed.cache.ttl, None);
        assert_eq!(parsed.traversal.yield_every, 64);
    }

    #[test]
    fn ttl_accepts_humantime_strings() {
        let parsed: Config =
            toml::from_str("[cache]\nenabled = true\nttl = \"30d\"\n").unwrap();
        assert_eq!(
            parsed.cache.ttl,
            Some(Duration::from_secs(30 * 24 * 60 * 60))
        );
    }
}
