use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CourtsideError, Result};
use crate::scanner::ColumnLayout;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Name looked for in the duty columns, as it appears on the sheets.
    #[serde(default)]
    pub person: String,
    #[serde(default)]
    pub drive: DriveSettings,
    /// Substring a schedule file name must contain (after normalization)
    /// for its assignments to be payment-tracked.
    #[serde(default = "default_payment_marker")]
    pub payment_marker: String,
    #[serde(default)]
    pub columns: ColumnLayout,
    #[serde(default)]
    pub whatsapp: WhatsAppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveSettings {
    /// ID of the shared folder the federation publishes schedules under.
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppSettings {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub api_key: String,
}

impl WhatsAppSettings {
    pub fn is_configured(&self) -> bool {
        !self.phone.is_empty() && !self.api_key.is_empty()
    }
}

impl Default for WhatsAppSettings {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            phone: String::new(),
            api_key: String::new(),
        }
    }
}

fn default_payment_marker() -> String {
    "LIG".to_string()
}

fn default_gateway_url() -> String {
    "https://api.callmebot.com/whatsapp.php".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            person: String::new(),
            drive: DriveSettings::default(),
            payment_marker: default_payment_marker(),
            columns: ColumnLayout::default(),
            whatsapp: WhatsAppSettings::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("courtside")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("courtside")
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
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CourtsideError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
