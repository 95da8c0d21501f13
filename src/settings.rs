use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::flows::{default_genre_mapping, VaultState};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:27123";
const LEGACY_HTTPS_API_URL: &str = "https://127.0.0.1:27124";

// How notes are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriterKind {
    #[default]
    Uri,
    Rest,
    Filesystem,
}

// App settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Vault name used in `obsidian://` URIs.
    pub vault_path: String,
    /// Vault directory on disk, for the filesystem writer.
    pub vault_root: Option<String>,
    pub default_location: String,
    pub default_significance: u8,
    pub vault_folders: Vec<String>,
    pub vault_tags: Vec<String>,
    pub genre_mapping: HashMap<String, String>,
    /// Regex matched against vault file names when listing templates.
    pub template_pattern: String,
    pub local_rest_api_url: String,
    pub local_rest_api_key: String,
    pub writer: WriterKind,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_path: String::new(),
            vault_root: None,
            default_location: "Books".to_string(),
            default_significance: 3,
            vault_folders: vec!["Books".into(), "Articles".into(), "Notes".into()],
            vault_tags: vec![
                "book".into(),
                "article".into(),
                "fiction".into(),
                "non-fiction".into(),
                "to-read".into(),
            ],
            genre_mapping: default_genre_mapping().into_iter().collect(),
            template_pattern: "Template".to_string(),
            local_rest_api_url: DEFAULT_API_URL.to_string(),
            local_rest_api_key: String::new(),
            writer: WriterKind::Uri,
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Fix values older releases stored that no longer work.
    pub fn normalize(mut self) -> Self {
        if self.local_rest_api_url.trim().is_empty() || self.local_rest_api_url == LEGACY_HTTPS_API_URL {
            self.local_rest_api_url = DEFAULT_API_URL.to_string();
        }
        self.local_rest_api_url = self.local_rest_api_url.trim_end_matches('/').to_string();
        self.vault_tags = clean_list(&self.vault_tags);
        self.vault_folders = clean_list(&self.vault_folders);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = 10;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn vault_state(&self) -> VaultState {
        VaultState {
            tags: self.vault_tags.clone(),
            genre_overrides: self.genre_mapping.clone(),
        }
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Get settings file path
pub fn default_settings_path() -> Result<PathBuf> {
    let config = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("could not determine the user config directory"))?;
    Ok(config.join("vault-agent").join("settings.json"))
}

// Load settings from disk
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Settings::default();
    }

    match std::fs::read_to_string(path).map(|content| serde_json::from_str::<Settings>(&content)) {
        Ok(Ok(settings)) => settings.normalize(),
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "settings file is invalid, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read settings, using defaults");
            Settings::default()
        }
    }
}

// Save settings to disk
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
