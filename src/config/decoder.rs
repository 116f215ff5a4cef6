//! Configuration file decoding
//!
//! The configuration is a JSON object. Only the keys modelled by
//! [`Configuration`] are recognized; anything else is ignored.

use crate::config::mapping::{null_as_empty, PluginMapping};
use crate::discovery::PluginKind;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Tool configuration: plugin port range, checkpoint flags and the explicit
/// plugin mappings for each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(rename = "PluginMinPort")]
    pub plugin_min_port: i64,

    #[serde(rename = "PluginMaxPort")]
    pub plugin_max_port: i64,

    pub disable_checkpoint: bool,

    pub disable_checkpoint_signature: bool,

    #[serde(deserialize_with = "null_as_empty")]
    pub builders: PluginMapping,

    #[serde(deserialize_with = "null_as_empty")]
    pub provisioners: PluginMapping,

    #[serde(rename = "post-processors", deserialize_with = "null_as_empty")]
    pub post_processors: PluginMapping,
}

impl Configuration {
    /// Mapping holding plugins of the given category
    pub fn mapping(&self, kind: PluginKind) -> &PluginMapping {
        match kind {
            PluginKind::Builder => &self.builders,
            PluginKind::Provisioner => &self.provisioners,
            PluginKind::PostProcessor => &self.post_processors,
        }
    }

    pub fn mapping_mut(&mut self, kind: PluginKind) -> &mut PluginMapping {
        match kind {
            PluginKind::Builder => &mut self.builders,
            PluginKind::Provisioner => &mut self.provisioners,
            PluginKind::PostProcessor => &mut self.post_processors,
        }
    }

    /// Total number of bound plugins across all categories
    pub fn plugin_count(&self) -> usize {
        PluginKind::ALL
            .iter()
            .map(|&kind| self.mapping(kind).len())
            .sum()
    }
}

/// Decode a configuration from a byte stream
pub fn decode<R: Read>(reader: R) -> Result<Configuration> {
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

/// Decode a configuration from an in-memory string
pub fn decode_str(content: &str) -> Result<Configuration> {
    let config = serde_json::from_str(content)?;
    Ok(config)
}
