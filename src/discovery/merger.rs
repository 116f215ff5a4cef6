//! Folding discovered plugins into a configuration
//!
//! Discovered plugins are bound with set-if-absent semantics, so an explicit
//! entry from the configuration file, or a plugin found in an earlier
//! directory, is never replaced.

use crate::config::Configuration;
use crate::discovery::{DiscoveredPlugin, PluginDirectory, PluginDiscoverer};
use crate::types::Result;
use tracing::{debug, info};

/// Outcome of a merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Plugins newly bound by this pass
    pub added: usize,

    /// Plugins skipped because their name was already bound
    pub shadowed: usize,
}

pub struct ConfigMerger {
    discoverer: PluginDiscoverer,
}

impl ConfigMerger {
    pub fn new(discoverer: PluginDiscoverer) -> Self {
        Self { discoverer }
    }

    /// Discover plugins in `dirs` and bind any that are not already present
    pub fn merge_external_components(
        &self,
        config: &mut Configuration,
        dirs: &[PluginDirectory],
    ) -> Result<MergeSummary> {
        let plugins = self.discoverer.discover(dirs)?;
        Ok(Self::apply(config, plugins))
    }

    /// Like [`merge_external_components`](Self::merge_external_components),
    /// listing directories in parallel. Bindings are still applied one at a
    /// time in directory order.
    pub async fn merge_external_components_concurrent(
        &self,
        config: &mut Configuration,
        dirs: &[PluginDirectory],
    ) -> Result<MergeSummary> {
        let plugins = self.discoverer.discover_concurrent(dirs).await?;
        Ok(Self::apply(config, plugins))
    }

    fn apply(config: &mut Configuration, plugins: Vec<DiscoveredPlugin>) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for plugin in plugins {
            let mapping = config.mapping_mut(plugin.kind);
            if mapping.set_if_absent(plugin.name.as_str(), plugin.path.as_path()) {
                summary.added += 1;
            } else {
                debug!(
                    "Ignoring {} plugin '{}' at {}: name already bound",
                    plugin.kind,
                    plugin.name,
                    plugin.path.display()
                );
                summary.shadowed += 1;
            }
        }

        info!(
            "Merged external plugins: {} added, {} shadowed",
            summary.added, summary.shadowed
        );
        summary
    }
}
