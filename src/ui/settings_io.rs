use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ui::settings::AppSettings;

const APP_DIR: &str = "npc_generator";

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("settings.json");
    path
}

pub fn load_settings() -> AppSettings {
    let path = settings_path();
    match load_from(&path) {
        Ok(Some(settings)) => settings,
        Ok(None) => AppSettings::default(),
        Err(e) => {
            log::warn!("ignoring settings at {}: {e:#}", path.display());
            AppSettings::default()
        }
    }
}

pub fn save_settings(settings: &AppSettings) {
    let path = settings_path();
    if let Err(e) = save_to(settings, &path) {
        log::warn!("could not save settings: {e:#}");
    }
}

fn load_from(path: &Path) -> Result<Option<AppSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).context("read failed")?;
    let settings = serde_json::from_str(&raw).context("invalid settings JSON")?;
    Ok(Some(settings))
}

fn save_to(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
