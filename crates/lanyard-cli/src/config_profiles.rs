//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lanyard_core::config::{ConfigError, RemoteConfig};
use lanyard_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("lanyard").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Explicit flag, then `LANYARD_PROFILE`, then the active profile, then "default"
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        if let Some(profile) = normalize_profile_name(explicit) {
            return profile;
        }
        if let Some(profile) =
            normalize_profile_name(env::var("LANYARD_PROFILE").ok().as_deref())
        {
            return profile;
        }
        if let Some(profile) = normalize_profile_name(self.active_profile.as_deref()) {
            return profile;
        }
        "default".to_string()
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn supabase_url(&self) -> Option<String> {
        normalize_text_option(self.supabase_url.clone())
    }

    pub fn supabase_anon_key(&self) -> Option<String> {
        normalize_text_option(self.supabase_anon_key.clone())
    }

    fn normalize(&mut self) {
        self.supabase_url = normalize_text_option(self.supabase_url.clone());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.clone());
        self.request_timeout_secs = self.request_timeout_secs.filter(|secs| *secs > 0);
    }
}

/// Remote settings for a run: `SUPABASE_URL` / `SUPABASE_ANON_KEY` override the profile.
pub fn remote_config_for(profile: Option<&CliProfile>) -> Result<Option<RemoteConfig>, ConfigError> {
    resolve_remote_config(
        profile,
        normalize_text_option(env::var("SUPABASE_URL").ok()),
        normalize_text_option(env::var("SUPABASE_ANON_KEY").ok()),
    )
}

pub fn resolve_remote_config(
    profile: Option<&CliProfile>,
    env_url: Option<String>,
    env_anon_key: Option<String>,
) -> Result<Option<RemoteConfig>, ConfigError> {
    let url = env_url.or_else(|| profile.and_then(CliProfile::supabase_url));
    let anon_key = env_anon_key.or_else(|| profile.and_then(CliProfile::supabase_anon_key));
    let timeout = profile.and_then(|profile| profile.request_timeout_secs);

    Ok(RemoteConfig::from_optional(url, anon_key)?.map(|config| match timeout {
        Some(secs) => config.with_request_timeout(Duration::from_secs(secs)),
        None => config,
    }))
}
