use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Locations of every file the application reads and writes.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
    settings_file: PathBuf,
    services_file: PathBuf,
    hosts_dir: PathBuf,
    logs_dir: PathBuf,
}

impl ConfigManager {
    /// Use `config_dir` when given, `$XDG_CONFIG_HOME/accessr` otherwise.
    pub fn new(config_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => dirs::config_dir()
                .context("Could not find config directory")?
                .join("accessr"),
        };

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        Ok(Self {
            settings_file: config_dir.join("settings.conf"),
            services_file: config_dir.join("services.conf"),
            hosts_dir: config_dir.join("hosts"),
            logs_dir: config_dir.join("logs"),
            config_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    pub fn services_file(&self) -> &Path {
        &self.services_file
    }

    pub fn hosts_dir(&self) -> &Path {
        &self.hosts_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }
}
