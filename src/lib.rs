//! packer-config - startup configuration for a plugin-based build tool
//!
//! Loads the user's configuration file and augments its builder,
//! provisioner and post-processor mappings with plugin executables found
//! on disk by filename convention. Explicit mappings are never overridden.

pub mod config;
pub mod discovery;
pub mod types;

pub use config::{ConfigLoader, Configuration, PluginMapping};
pub use discovery::{ConfigMerger, PluginDiscoverer, PluginKind};
pub use types::ConfigError;

/// Tool name used for plugin filename prefixes and environment variables
pub const DEFAULT_TOOL_NAME: &str = "packer";
