//! Configuration loading
//!
//! Explicit plugin mappings come from the configuration file and always win;
//! plugins discovered on disk only fill in names the file does not bind.

mod decoder;
mod loader;
mod locator;
mod mapping;

pub use decoder::{decode, decode_str, Configuration};
pub use loader::ConfigLoader;
pub use locator::{env_var_name, load_config, ConfigLocator, SearchPaths};
pub use mapping::PluginMapping;
