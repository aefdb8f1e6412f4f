use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asf_core::vm::PointerWidth;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Defaults read from a TOML file; command-line flags take precedence.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Folder module names are relative to.
    pub data_root: Option<PathBuf>,
    /// Environment registry (JSON).
    pub registry: Option<PathBuf>,
    pub pointer_width: PointerWidth,
    pub logger: LoggerConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggerConfig {
    /// Level for the tool's own crates.
    pub app_level_filter: LevelFilter,
    pub level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { app_level_filter: LevelFilter::Info, level_filter: LevelFilter::Warn }
    }
}

impl DumpConfig {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config: {}", path.display()))
    }
}

impl LoggerConfig {
    /// Install the global logger. `RUST_LOG` still overrides these levels.
    pub fn init(&self, verbose: bool) {
        let app_level = if verbose { LevelFilter::Debug } else { self.app_level_filter };
        let installed = env_logger::Builder::new()
            .filter_level(self.level_filter)
            .filter_module("asf_core", app_level)
            .filter_module("asfdis", app_level)
            .parse_default_env()
            .format_target(false)
            .try_init();
        if let Err(err) = installed {
            // an earlier logger keeps receiving the records
            log::debug!("logger not installed: {}", err);
        }
    }
}
