//! Configuration file and plugin search path resolution
//!
//! Environment lookups happen only in the `from_env` constructors. Everything
//! downstream receives resolved paths explicitly, so tests never need to touch
//! the process environment.

use crate::config::decoder::{decode, Configuration};
use crate::discovery::PluginDirectory;
use crate::types::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of a tool-scoped environment variable, e.g. `PACKER_CONFIG`
pub fn env_var_name(tool_name: &str, suffix: &str) -> String {
    format!("{}_{}", tool_name.to_uppercase().replace('-', "_"), suffix)
}

/// Resolves where the configuration file and per-user plugins live
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    tool_name: String,

    /// Explicit configuration file, takes priority over the default location
    pub override_path: Option<PathBuf>,

    pub home_dir: Option<PathBuf>,

    /// Platform configuration directory (used on Windows)
    pub config_dir: Option<PathBuf>,
}

impl ConfigLocator {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            override_path: None,
            home_dir: None,
            config_dir: None,
        }
    }

    /// Build a locator from `$<TOOL>_CONFIG` and the user's home directories
    pub fn from_env(tool_name: &str) -> Self {
        let override_path = env::var_os(env_var_name(tool_name, "CONFIG"))
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Self {
            tool_name: tool_name.to_string(),
            override_path,
            home_dir: dirs::home_dir(),
            config_dir: dirs::config_dir(),
        }
    }

    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(path.into());
        self
    }

    pub fn with_config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(path.into());
        self
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Configuration file to load.
    ///
    /// Priority order:
    /// 1. Explicit override
    /// 2. `~/.<tool>config` (Unix) or `<config dir>/<tool>.config` (Windows)
    pub fn config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.override_path {
            return Some(path.clone());
        }

        if cfg!(windows) {
            self.config_dir
                .as_ref()
                .map(|dir| dir.join(format!("{}.config", self.tool_name)))
        } else {
            self.home_dir
                .as_ref()
                .map(|dir| dir.join(format!(".{}config", self.tool_name)))
        }
    }

    /// Per-user plugin directory: `~/.<tool>.d/plugins` (Unix) or
    /// `<config dir>/<tool>.d/plugins` (Windows)
    pub fn plugin_home(&self) -> Option<PathBuf> {
        let base = if cfg!(windows) {
            self.config_dir
                .as_ref()
                .map(|dir| dir.join(format!("{}.d", self.tool_name)))
        } else {
            self.home_dir
                .as_ref()
                .map(|dir| dir.join(format!(".{}.d", self.tool_name)))
        };

        base.map(|dir| dir.join("plugins"))
    }
}

/// Load a configuration file. A missing file yields the default configuration.
pub fn load_config(path: &Path) -> Result<Configuration> {
    match fs::File::open(path) {
        Ok(file) => {
            debug!("Loading configuration from: {}", path.display());
            decode(BufReader::new(file))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No configuration file at {}, using defaults", path.display());
            Ok(Configuration::default())
        }
        Err(e) => Err(ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Locations scanned for plugin executables
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    /// Directory containing the running executable
    pub exe_dir: Option<PathBuf>,

    /// Entries from `$<TOOL>_PLUGIN_PATH`
    pub plugin_path: Vec<PathBuf>,

    /// Directories the caller insists on, e.g. from the command line; these must exist
    pub required_dirs: Vec<PathBuf>,

    pub plugin_home: Option<PathBuf>,

    pub working_dir: Option<PathBuf>,
}

impl SearchPaths {
    pub fn from_env(locator: &ConfigLocator) -> Self {
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        let plugin_path = env::var_os(env_var_name(locator.tool_name(), "PLUGIN_PATH"))
            .map(|value| {
                env::split_paths(&value)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            exe_dir,
            plugin_path,
            required_dirs: Vec::new(),
            plugin_home: locator.plugin_home(),
            working_dir: env::current_dir().ok(),
        }
    }

    /// Directories to scan, highest precedence first.
    ///
    /// Paths are normalized and listed once. If the same directory appears
    /// both as optional and required, it keeps its first position and is
    /// treated as required.
    pub fn directories(&self) -> Vec<PluginDirectory> {
        let candidates = self
            .exe_dir
            .iter()
            .map(PluginDirectory::optional)
            .chain(self.plugin_path.iter().map(PluginDirectory::optional))
            .chain(self.required_dirs.iter().map(PluginDirectory::required))
            .chain(self.plugin_home.iter().map(PluginDirectory::optional))
            .chain(self.working_dir.iter().map(PluginDirectory::optional));

        let mut dirs: Vec<PluginDirectory> = Vec::new();
        let mut seen: HashMap<PathBuf, usize> = HashMap::new();

        for mut dir in candidates {
            dir.path = path_clean::clean(&dir.path);
            match seen.get(&dir.path) {
                Some(&i) => dirs[i].required |= dir.required,
                None => {
                    seen.insert(dir.path.clone(), dirs.len());
                    dirs.push(dir);
                }
            }
        }

        info!("Plugin search directories: {}", dirs.len());
        dirs
    }
}
