use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::api::normalize_base_url;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "shop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopSettings {
    pub api_base_url: String,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub payment_required: bool,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://shopping-backend-express.onrender.com".into(),
            search_debounce_ms: 300,
            request_timeout_secs: 15,
            payment_required: false,
        }
    }
}

impl ShopSettings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    search_debounce_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    payment_required: Option<bool>,
}

/// Defaults, then the settings file, then the process environment.
///
/// An explicitly named file must exist; the default `shop.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ShopSettings> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    let mut settings = ShopSettings::default();
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    validate(settings)
}

pub fn apply_file(settings: &mut ShopSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.payment_required {
        settings.payment_required = v;
    }
    Ok(())
}

pub fn apply_env(
    settings: &mut ShopSettings,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("SHOP_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = var("APP__SEARCH_DEBOUNCE_MS") {
        settings.search_debounce_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__SEARCH_DEBOUNCE_MS must be milliseconds, got '{v}'"))?;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECS must be seconds, got '{v}'"))?;
    }

    if let Some(v) = var("APP__PAYMENT_REQUIRED") {
        settings.payment_required = match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => bail!("APP__PAYMENT_REQUIRED must be a boolean, got '{other}'"),
        };
    }

    Ok(())
}

pub fn validate(mut settings: ShopSettings) -> anyhow::Result<ShopSettings> {
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    if settings.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be greater than zero");
    }
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
