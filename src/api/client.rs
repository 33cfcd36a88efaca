//! Signed-in client over the local stores
//!
//! Bundles the config, the current identity, the message log and the product
//! catalog so command handlers can share one setup path.

use anyhow::{Context, Result};

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::models::Identity;
use crate::rooms::InboxProjector;
use crate::store::{LocalStore, ProductCatalog};

/// Client that acts as the signed-in user.
pub struct MarketClient {
    config: Config,
    user: Identity,
    store: LocalStore,
    catalog: ProductCatalog,
}

impl MarketClient {
    /// Load config and open the stores. Fails if nobody is logged in.
    pub fn new() -> Result<Self> {
        Self::from_config(Config::load()?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let user = config
            .current_user()
            .context("Not logged in. Run 'ecomarket-chat login' first.")?;

        let data_dir = config.data_dir()?;
        tracing::debug!("Using data directory {}", data_dir.display());

        let store = LocalStore::open(&data_dir)
            .with_context(|| format!("Failed to open message log in {}", data_dir.display()))?;
        let catalog = ProductCatalog::open(&data_dir)
            .with_context(|| format!("Failed to open product catalog in {}", data_dir.display()))?;

        Ok(Self {
            config,
            user,
            store,
            catalog,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user(&self) -> &Identity {
        &self.user
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LocalStore {
        &mut self.store
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ProductCatalog {
        &mut self.catalog
    }

    /// Re-read the catalog and the message log for changes made by other
    /// clients. Returns how many messages were new or changed.
    pub fn refresh(&mut self) -> Result<usize> {
        self.catalog
            .refresh()
            .context("Failed to re-read product catalog")?;
        self.store.refresh().context("Failed to re-read message log")
    }

    /// Inbox projector resolving product names through the catalog.
    pub fn projector(&self) -> InboxProjector<'_> {
        InboxProjector::new(&self.catalog).with_placeholder(self.config.placeholder_product_name())
    }
}
