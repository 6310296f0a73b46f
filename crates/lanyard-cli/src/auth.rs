//! CLI Supabase session persistence in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use lanyard_core::auth::{
    AuthError, AuthResult, AuthSession, SessionPersistence, SupabaseAuthClient, SupabaseIdentity,
};
use lanyard_core::config::RemoteConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "lanyard-cli";

/// Keychain slot holding one profile's Supabase session
#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        if let Some(raw) = guard.get(&self.username) {
            Ok(Some(serde_json::from_str(raw)?))
        } else {
            Ok(None)
        }
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

pub fn auth_client(
    profile_name: &str,
    config: &RemoteConfig,
) -> AuthResult<SupabaseAuthClient<SessionStore>> {
    SupabaseAuthClient::new(config, SessionStore::new(profile_name))
}

/// Identity that sync runs as: the profile's restored (and refreshed) session
pub fn identity_for_profile(
    profile_name: &str,
    config: &RemoteConfig,
) -> AuthResult<SupabaseIdentity<SessionStore>> {
    auth_client(profile_name, config).map(SupabaseIdentity::new)
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use lanyard_core::auth::AuthUser;

    use super::*;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: user.to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn session_store_is_scoped_per_profile() {
        SessionStore::new("auth-test-work")
            .save_session(&session("worker"))
            .unwrap();

        let stored = load_stored_session("auth-test-work").unwrap().unwrap();
        assert_eq!(stored.user.id, "worker");
        assert!(load_stored_session("auth-test-home").unwrap().is_none());

        clear_stored_session("auth-test-work").unwrap();
        assert!(load_stored_session("auth-test-work").unwrap().is_none());
    }

    #[test]
    fn clearing_missing_session_is_ok() {
        assert!(clear_stored_session("auth-test-never-stored").is_ok());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session("user"));
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
