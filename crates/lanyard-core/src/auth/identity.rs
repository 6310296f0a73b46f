//! Who the sync runs as

use std::fmt;

use super::{AuthSession, SessionPersistence, SupabaseAuthClient};

/// The authenticated owner that scopes remote reads and writes
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    /// Bearer token for remote calls; absent for in-process remotes
    pub access_token: Option<String>,
}

impl Principal {
    /// Principal with no remote credentials
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            access_token: None,
        }
    }
}

impl From<&AuthSession> for Principal {
    fn from(session: &AuthSession) -> Self {
        Self {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            access_token: Some(session.access_token.clone()),
        }
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Answers "who is signed in right now", or nobody
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn current_user(&self) -> Option<Principal>;
}

/// Fixed identity, for tests and scripted runs
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Principal>);

impl StaticIdentity {
    pub const fn signed_in(principal: Principal) -> Self {
        Self(Some(principal))
    }

    pub const fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Option<Principal> {
        self.0.clone()
    }
}

/// Identity backed by the persisted Supabase session
#[derive(Clone)]
pub struct SupabaseIdentity<S: SessionPersistence> {
    client: SupabaseAuthClient<S>,
}

impl<S: SessionPersistence> SupabaseIdentity<S> {
    pub const fn new(client: SupabaseAuthClient<S>) -> Self {
        Self { client }
    }
}

impl<S: SessionPersistence> IdentityProvider for SupabaseIdentity<S> {
    /// Restore failures are treated as signed out; sync is opportunistic.
    async fn current_user(&self) -> Option<Principal> {
        match self.client.restore_session().await {
            Ok(session) => session.as_ref().map(Principal::from),
            Err(error) => {
                tracing::warn!("Could not restore auth session: {}", error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, AuthResult, AuthUser};
    use crate::config::RemoteConfig;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemorySessions(Arc<Mutex<Option<AuthSession>>>);

    impl SessionPersistence for MemorySessions {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
            *self.0.lock().unwrap() = Some(session.clone());
            Ok(())
        }

        fn clear_session(&self) -> AuthResult<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    fn identity(store: MemorySessions) -> SupabaseIdentity<MemorySessions> {
        let config = RemoteConfig::new("http://127.0.0.1:9", "anon").unwrap();
        SupabaseIdentity::new(SupabaseAuthClient::new(&config, store).unwrap())
    }

    #[tokio::test]
    async fn static_identity_reports_principal() {
        assert!(StaticIdentity::anonymous().current_user().await.is_none());

        let principal = StaticIdentity::signed_in(Principal::new("user-1"))
            .current_user()
            .await
            .unwrap();
        assert_eq!(principal.id, "user-1");
    }

    #[tokio::test]
    async fn supabase_identity_without_session_is_anonymous() {
        let identity = identity(MemorySessions::default());
        assert!(identity.current_user().await.is_none());
    }

    #[tokio::test]
    async fn supabase_identity_uses_fresh_session() {
        let store = MemorySessions::default();
        store
            .save_session(&AuthSession {
                access_token: "token".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: i64::MAX,
                user: AuthUser {
                    id: "user-1".to_string(),
                    email: Some("me@example.com".to_string()),
                },
            })
            .unwrap();

        let principal = identity(store).current_user().await.unwrap();
        assert_eq!(principal.id, "user-1");
        assert_eq!(principal.access_token.as_deref(), Some("token"));
    }

    fn expired_session(refresh_token: &str) -> AuthSession {
        AuthSession {
            access_token: "stale".to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: 0,
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        }
    }

    #[tokio::test]
    async fn offline_refresh_keeps_stored_session() {
        let store = MemorySessions::default();
        store.save_session(&expired_session("refresh")).unwrap();

        // Nothing listens on the discard port, so the refresh never reaches a server
        let identity = identity(store.clone());
        assert!(identity.current_user().await.is_none());

        let error = identity.client.restore_session().await.unwrap_err();
        assert!(matches!(error, AuthError::Http(_)));

        let kept = store.load_session().unwrap().unwrap();
        assert_eq!(kept.refresh_token, "refresh");
    }

    #[tokio::test]
    async fn unusable_refresh_token_clears_stored_session() {
        let store = MemorySessions::default();
        store.save_session(&expired_session("  ")).unwrap();

        assert!(identity(store.clone()).current_user().await.is_none());
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn principal_debug_redacts_token() {
        let mut principal = Principal::new("user-1");
        principal.access_token = Some("secret".to_string());
        let rendered = format!("{principal:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
