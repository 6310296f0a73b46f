use std::env;

use lanyard_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use lanyard_core::util::{is_http_url, normalize_text_option};
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config_profiles::{remote_config_for, CliProfile, CliProfilesConfig};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    active: bool,
    supabase_url: Option<String>,
    supabase_anon_key_set: bool,
    request_timeout_secs: u64,
    sync_ready: bool,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            request_timeout_secs,
            no_activate,
        } => {
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);
            apply_config_init(
                &mut config,
                &profile_name,
                ProfileUpdate {
                    supabase_url: normalize_text_option(supabase_url)
                        .or_else(|| normalize_text_option(env::var("SUPABASE_URL").ok())),
                    supabase_anon_key: normalize_text_option(supabase_anon_key)
                        .or_else(|| normalize_text_option(env::var("SUPABASE_ANON_KEY").ok())),
                    request_timeout_secs,
                },
                !no_activate,
            )?;

            let path = config.save().map_err(CliError::Config)?;
            println!(
                "Profile '{}' initialized at {}",
                profile_name,
                path.display()
            );

            let missing = missing_fields(config.profile(&profile_name));
            if missing.is_empty() {
                println!(
                    "Profile '{profile_name}' is ready. Run `lanyard auth login --email <email> --password <password>`."
                );
            } else {
                println!(
                    "Profile '{}' is missing: {}",
                    profile_name,
                    missing.join(", ")
                );
            }
            Ok(())
        }
        ConfigCommands::Show { json } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);
            let profile = config.profile(&profile_name).cloned().unwrap_or_default();
            let remote = remote_config_for(Some(&profile));

            let view = ProfileView {
                name: &profile_name,
                active: config.active_profile.as_deref() == Some(profile_name.as_str()),
                supabase_url: normalize_text_option(env::var("SUPABASE_URL").ok())
                    .or_else(|| profile.supabase_url()),
                supabase_anon_key_set: normalize_text_option(env::var("SUPABASE_ANON_KEY").ok())
                    .or_else(|| profile.supabase_anon_key())
                    .is_some(),
                request_timeout_secs: profile
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                sync_ready: matches!(remote, Ok(Some(_))),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("profile:      {}", view.name);
                println!("active:       {}", view.active);
                println!(
                    "supabase_url: {}",
                    view.supabase_url.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "anon key:     {}",
                    if view.supabase_anon_key_set {
                        "set"
                    } else {
                        "(not set)"
                    }
                );
                println!("timeout:      {}s", view.request_timeout_secs);
                if let Err(error) = remote {
                    println!("warning:      {error}");
                }
            }
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Merge explicit values into the named profile; unset values keep what is stored
pub fn apply_config_init(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    update: ProfileUpdate,
    activate: bool,
) -> Result<(), CliError> {
    if let Some(url) = &update.supabase_url {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    if update.request_timeout_secs == Some(0) {
        return Err(CliError::Config(
            "request_timeout_secs must be greater than zero".to_string(),
        ));
    }

    let profile = config.profile_mut_or_default(profile_name);
    if let Some(value) = update.supabase_url {
        profile.supabase_url = Some(value);
    }
    if let Some(value) = update.supabase_anon_key {
        profile.supabase_anon_key = Some(value);
    }
    if let Some(value) = update.request_timeout_secs {
        profile.request_timeout_secs = Some(value);
    }

    if activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

pub fn missing_fields(profile: Option<&CliProfile>) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.and_then(CliProfile::supabase_url).is_none() {
        missing.push("supabase_url");
    }
    if profile.and_then(CliProfile::supabase_anon_key).is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}
