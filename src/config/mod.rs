//! Configuration and identity storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::IdentityProvider;
use crate::models::Identity;
use crate::rooms::inbox::PLACEHOLDER_CONTEXT_NAME;

const DEFAULT_WATCH_INTERVAL_SECS: u64 = 2;

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the message log and product catalog live (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Name shown for chats whose product can no longer be found
    pub placeholder_product_name: Option<String>,
    /// Seconds between checks for new messages in `watch`
    pub watch_interval_secs: Option<u64>,
    /// Signed-in user (from last login)
    pub user: Option<Identity>,
}

impl Config {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "ecomarket", "ecomarket-chat")
            .context("Could not determine config directory")
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Identity lives here; keep it private to the user.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Directory holding `messages.jsonl` and `products.json`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match self.data_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn placeholder_product_name(&self) -> &str {
        self.placeholder_product_name
            .as_deref()
            .unwrap_or(PLACEHOLDER_CONTEXT_NAME)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(
            self.watch_interval_secs
                .unwrap_or(DEFAULT_WATCH_INTERVAL_SECS)
                .max(1),
        )
    }
}

impl IdentityProvider for Config {
    fn current_user(&self) -> Option<Identity> {
        self.user.clone()
    }

    fn set_user(&mut self, identity: Identity) {
        self.user = Some(identity);
    }

    fn clear_user(&mut self) {
        self.user = None;
    }
}
