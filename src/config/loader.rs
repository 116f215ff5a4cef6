//! Startup configuration loading
//!
//! Loading happens once per process:
//! 1. Resolve the configuration file (override or default location)
//! 2. Decode it, or fall back to defaults when it does not exist
//! 3. Discover plugin executables and merge them in without replacing
//!    explicit entries
//!
//! The returned [`Configuration`] is meant to be treated as read-only from
//! then on.

use crate::config::decoder::Configuration;
use crate::config::locator::{load_config, ConfigLocator, SearchPaths};
use crate::discovery::{ConfigMerger, PluginDiscoverer, PluginKind};
use crate::types::Result;
use tracing::{info, warn};

pub struct ConfigLoader {
    locator: ConfigLocator,
    merger: ConfigMerger,
}

impl ConfigLoader {
    pub fn new(locator: ConfigLocator, discoverer: PluginDiscoverer) -> Self {
        Self {
            locator,
            merger: ConfigMerger::new(discoverer),
        }
    }

    pub fn locator(&self) -> &ConfigLocator {
        &self.locator
    }

    /// Read the configuration file without discovering plugins
    pub fn load_without_discovery(&self) -> Result<Configuration> {
        match self.locator.config_file() {
            Some(path) => {
                info!("Reading configuration: {}", path.display());
                load_config(&path)
            }
            None => {
                warn!("Cannot determine configuration file location, using defaults");
                Ok(Configuration::default())
            }
        }
    }

    /// Read the configuration file and merge in plugins found on `search`
    pub fn load(&self, search: &SearchPaths) -> Result<Configuration> {
        let mut config = self.load_without_discovery()?;
        self.merger
            .merge_external_components(&mut config, &search.directories())?;

        Self::log_loaded(&config);
        Ok(config)
    }

    /// Same as [`load`](Self::load), listing plugin directories in parallel
    pub async fn load_concurrent(&self, search: &SearchPaths) -> Result<Configuration> {
        let mut config = self.load_without_discovery()?;
        self.merger
            .merge_external_components_concurrent(&mut config, &search.directories())
            .await?;

        Self::log_loaded(&config);
        Ok(config)
    }

    fn log_loaded(config: &Configuration) {
        for kind in PluginKind::ALL {
            info!("Loaded {} {} plugins", config.mapping(kind).len(), kind);
        }
    }
}
