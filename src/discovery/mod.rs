//! External plugin discovery and merging

mod discoverer;
mod merger;

pub use discoverer::{DiscoveredPlugin, PluginDirectory, PluginDiscoverer, PluginKind};
pub use merger::{ConfigMerger, MergeSummary};
