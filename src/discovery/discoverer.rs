//! External plugin discovery
//!
//! Plugins are standalone executables named by convention:
//!
//! - `<tool>-builder-<name>[<exe-suffix>]`
//! - `<tool>-provisioner-<name>[<exe-suffix>]`
//! - `<tool>-post-processor-<name>[<exe-suffix>]`
//!
//! Directories are scanned non-recursively and strictly in the order given,
//! so a plugin found in an earlier directory shadows one of the same name
//! found later.

use crate::types::{ConfigError, Result};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Plugin category, in filename matching precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    Builder,
    Provisioner,
    PostProcessor,
}

impl PluginKind {
    pub const ALL: [PluginKind; 3] = [
        PluginKind::Builder,
        PluginKind::Provisioner,
        PluginKind::PostProcessor,
    ];

    /// Category segment used in plugin filenames
    pub fn infix(self) -> &'static str {
        match self {
            PluginKind::Builder => "builder",
            PluginKind::Provisioner => "provisioner",
            PluginKind::PostProcessor => "post-processor",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.infix())
    }
}

/// A location to scan for plugins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDirectory {
    pub path: PathBuf,

    /// Whether a failure to list this directory aborts discovery
    pub required: bool,
}

impl PluginDirectory {
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
        }
    }

    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }
}

/// A plugin executable found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPlugin {
    pub kind: PluginKind,
    pub name: String,
    pub path: PathBuf,
}

/// Scans directories for plugin executables of a given tool
#[derive(Debug, Clone)]
pub struct PluginDiscoverer {
    /// `<tool>-<infix>-` prefix per kind, in precedence order
    prefixes: Vec<(PluginKind, String)>,

    /// Executable suffix stripped from plugin names (empty on Unix)
    exe_suffix: String,
}

impl PluginDiscoverer {
    pub fn new(tool_name: &str) -> Self {
        let prefixes = PluginKind::ALL
            .iter()
            .map(|&kind| (kind, format!("{}-{}-", tool_name, kind.infix())))
            .collect();

        Self {
            prefixes,
            exe_suffix: std::env::consts::EXE_SUFFIX.to_string(),
        }
    }

    /// Override the platform executable suffix
    pub fn with_exe_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.exe_suffix = suffix.into();
        self
    }

    /// Match a filename against the plugin naming convention.
    ///
    /// Returns the plugin kind and name, or `None` if the filename is not a
    /// plugin or the name would be empty.
    pub fn classify(&self, file_name: &str) -> Option<(PluginKind, String)> {
        let (kind, rest) = self.prefixes.iter().find_map(|(kind, prefix)| {
            file_name
                .strip_prefix(prefix.as_str())
                .map(|rest| (*kind, rest))
        })?;

        let name = if self.exe_suffix.is_empty() {
            rest
        } else {
            rest.strip_suffix(self.exe_suffix.as_str()).unwrap_or(rest)
        };

        if name.is_empty() {
            return None;
        }

        Some((kind, name.to_string()))
    }

    /// List a single directory and return the plugins it contains.
    ///
    /// Entries are visited in filename order. Sub-directories and files that
    /// do not follow the naming convention are skipped.
    pub fn scan_directory(&self, dir: &Path) -> io::Result<Vec<DiscoveredPlugin>> {
        let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut plugins = Vec::new();
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                debug!("Skipping non UTF-8 filename in {}", dir.display());
                continue;
            };

            if let Some((kind, name)) = self.classify(file_name) {
                debug!("Discovered {} plugin '{}' at {}", kind, name, path.display());
                plugins.push(DiscoveredPlugin { kind, name, path });
            }
        }

        Ok(plugins)
    }

    /// Scan directories in order and collect every plugin found.
    ///
    /// An optional directory that cannot be listed contributes nothing. A
    /// required one fails the whole discovery.
    pub fn discover(&self, dirs: &[PluginDirectory]) -> Result<Vec<DiscoveredPlugin>> {
        let mut plugins = Vec::new();

        for dir in dirs {
            let scanned = self.scan_directory(&dir.path);
            Self::collect(dir, scanned, &mut plugins)?;
        }

        Ok(plugins)
    }

    /// Same as [`discover`](Self::discover), but lists all directories in
    /// parallel on the blocking pool. Results are still returned in the
    /// original directory order.
    pub async fn discover_concurrent(
        &self,
        dirs: &[PluginDirectory],
    ) -> Result<Vec<DiscoveredPlugin>> {
        let scans = dirs.iter().map(|dir| {
            let discoverer = self.clone();
            let path = dir.path.clone();
            tokio::task::spawn_blocking(move || discoverer.scan_directory(&path))
        });
        let results = join_all(scans).await;

        let mut plugins = Vec::new();
        for (dir, joined) in dirs.iter().zip(results) {
            let scanned = joined
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
                .and_then(|scanned| scanned);
            Self::collect(dir, scanned, &mut plugins)?;
        }

        Ok(plugins)
    }

    fn collect(
        dir: &PluginDirectory,
        scanned: io::Result<Vec<DiscoveredPlugin>>,
        plugins: &mut Vec<DiscoveredPlugin>,
    ) -> Result<()> {
        match scanned {
            Ok(found) => {
                debug!("Found {} plugins in {}", found.len(), dir.path.display());
                plugins.extend(found);
                Ok(())
            }
            Err(e) if dir.required => Err(ConfigError::DirectoryRead {
                path: dir.path.clone(),
                source: e,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Plugin directory {} does not exist, skipping", dir.path.display());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to read plugin directory {}: {}", dir.path.display(), e);
                Ok(())
            }
        }
    }
}
