use crate::auth::{auth_client, clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::config_profiles::{remote_config_for, CliProfilesConfig};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let remote_config = remote_config_for(config.profile(&profile_name))?;

    match command {
        AuthCommands::Login { email, password } => {
            let remote_config = remote_config.ok_or_else(|| {
                CliError::Config(format!(
                    "Profile '{profile_name}' missing Supabase config. Run `lanyard config init --profile {profile_name}` first."
                ))
            })?;
            let session = auth_client(&profile_name, &remote_config)?
                .sign_in(&email, &password)
                .await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Status => {
            let session = if let Some(remote_config) = &remote_config {
                auth_client(&profile_name, remote_config)?
                    .restore_session()
                    .await?
            } else {
                load_stored_session(&profile_name)?
            };

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (expires_at={})",
                    profile_name, email_label, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let stored_session = load_stored_session(&profile_name)?;

            if let (Some(remote_config), Some(session)) = (&remote_config, stored_session) {
                auth_client(&profile_name, remote_config)?
                    .sign_out(&session.access_token)
                    .await?;
            } else {
                clear_stored_session(&profile_name)?;
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
