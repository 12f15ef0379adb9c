use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::PAGE_SIZES;
use crate::error::{EdaError, Result};
use crate::session::SessionOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default)]
    pub remember_filters: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Last file loaded successfully; offered again by the upload prompt.
    #[serde(default)]
    pub last_file: Option<String>,
}

fn default_rows_per_page() -> usize {
    PAGE_SIZES[0]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows_per_page: default_rows_per_page(),
            remember_filters: false,
            log_level: default_log_level(),
            last_file: None,
        }
    }
}

impl Settings {
    pub fn session_options(&self) -> SessionOptions {
        let rows = if PAGE_SIZES.contains(&self.rows_per_page) {
            self.rows_per_page
        } else {
            default_rows_per_page()
        };
        SessionOptions {
            remember_filters: self.remember_filters,
            default_rows_per_page: rows,
        }
    }
}

/// `$SALESCOPE_CONFIG_DIR`, else `~/.config/salescope`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SALESCOPE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("salescope")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    if !PAGE_SIZES.contains(&settings.rows_per_page) {
        return Err(EdaError::Settings(format!(
            "rows_per_page must be one of {PAGE_SIZES:?}, got {}",
            settings.rows_per_page
        )));
    }
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| EdaError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    tracing::info!(path = %settings_path().display(), "settings saved");
    Ok(())
}

/// Remember a successfully loaded file. Failures only get logged.
pub fn remember_last_file(path: &str) {
    let mut settings = load_settings();
    if settings.last_file.as_deref() == Some(path) {
        return;
    }
    settings.last_file = Some(path.to_string());
    if let Err(e) = save_settings(&settings) {
        tracing::warn!(error = %e, "could not record last file");
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
