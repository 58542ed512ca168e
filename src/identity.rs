//! Login, logout and bearer-token authentication.
//!
//! A token is only honoured while the session it names still exists, belongs
//! to the token's subject and has not expired. Each authenticated request
//! touches the session and appends a history entry; both are best-effort.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{HistoryEntry, Session, SessionId, User, UserId};
use crate::security::{IssuedToken, PasswordHasherConfig, TokenService};
use crate::store::{Store, StoreError};
use crate::AppState;

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub user: User,
}

#[derive(Clone)]
pub struct Identity {
    store: Store,
    tokens: TokenService,
    hasher: PasswordHasherConfig,
    token_ttl: Duration,
}

fn unauthorized_if_missing(err: StoreError) -> AppError {
    if err.is_not_found() {
        AppError::Unauthorized
    } else {
        err.into()
    }
}

impl Identity {
    pub fn new(store: Store, config: &Config) -> std::result::Result<Self, String> {
        Ok(Self {
            store,
            tokens: TokenService::new(&config.jwt_secret),
            hasher: PasswordHasherConfig::new(config.argon2_memory_kib, config.argon2_iterations)?,
            token_ttl: Duration::seconds(config.token_ttl_secs),
        })
    }

    /// Hash a password off the async runtime
    pub async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(AppError::Internal)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))
    }

    /// Check credentials and open a new session
    pub async fn login(&self, name: &str, password: String) -> Result<IssuedToken> {
        let Some(user) = self.store.find_user_by_name(name).await? else {
            tracing::warn!("Login attempt for unknown user");
            return Err(AppError::Unauthorized);
        };

        if !self.verify_password(password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Login rejected: bad password");
            return Err(AppError::Unauthorized);
        }

        let now = Utc::now();
        let session = Session::new(user.id, self.token_ttl, now);
        self.store.insert_session(&session).await?;

        let issued = self
            .tokens
            .issue(user.id, session.id, now, session.expires_at)
            .map_err(AppError::Internal)?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "User logged in");
        Ok(issued)
    }

    /// Resolve a bearer token to the caller
    pub async fn authenticate(&self, token: &str) -> Result<Principal> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::warn!("Token rejected: {}", e);
            AppError::Unauthorized
        })?;

        let (Some(user_id), Some(session_id)) =
            (UserId::parse(&claims.sub), SessionId::parse(&claims.sid))
        else {
            tracing::warn!("Token carries malformed ids");
            return Err(AppError::Unauthorized);
        };

        let now = Utc::now();
        let session = self
            .store
            .get_session(session_id)
            .await
            .map_err(unauthorized_if_missing)?;

        if session.user_id != user_id {
            tracing::warn!(session_id = %session_id, "Session does not belong to token subject");
            return Err(AppError::Unauthorized);
        }
        if session.is_expired(now) {
            tracing::warn!(session_id = %session_id, "Session expired");
            if let Err(e) = self.store.delete_session(session_id).await {
                tracing::warn!(session_id = %session_id, "Failed to drop expired session: {}", e);
            }
            return Err(AppError::Unauthorized);
        }

        let user = self
            .store
            .get_user(user_id)
            .await
            .map_err(unauthorized_if_missing)?;

        if let Err(e) = self.store.touch_session(session_id, now).await {
            tracing::warn!(session_id = %session_id, "Failed to record session activity: {}", e);
        }
        if let Err(e) = self.store.append_history(&HistoryEntry::new(user_id, now)).await {
            tracing::warn!(user_id = %user_id, "Failed to append history: {}", e);
        }

        Ok(Principal {
            user_id,
            session_id,
            user,
        })
    }

    /// End the caller's session
    pub async fn logout(&self, principal: &Principal) -> Result<()> {
        self.store
            .delete_session(principal.session_id)
            .await
            .map_err(unauthorized_if_missing)?;
        tracing::info!(user_id = %principal.user_id, "User logged out");
        Ok(())
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        state.identity.authenticate(token.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::StoreBackendKind;
    use crate::store::testing::FlakyBackend;
    use crate::store::{StoreBackend, Timeouts};

    fn test_config(ttl_secs: i64) -> Config {
        Config {
            server_host: "127.0.0.1".into(),
            server_port: 0,
            store_backend: StoreBackendKind::Memory,
            database_path: String::new(),
            allowed_origins: vec![],
            environment: "test".into(),
            jwt_secret: "identity-test-secret".into(),
            token_ttl_secs: ttl_secs,
            store_point_timeout_ms: 5000,
            store_multi_step_timeout_ms: 10000,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            log_requests: false,
        }
    }

    async fn setup(ttl_secs: i64) -> (Arc<FlakyBackend>, Identity, UserId) {
        let backend = Arc::new(FlakyBackend::new());
        let store = Store::new(backend.clone(), Timeouts::default());
        let identity = Identity::new(store.clone(), &test_config(ttl_secs)).unwrap();

        let hash = identity.hash_password("hunter2hunter2".into()).await.unwrap();
        let user = User::new("alice".into(), hash, Utc::now());
        store.insert_user(&user).await.unwrap();
        (backend, identity, user.id)
    }

    #[tokio::test]
    async fn test_login_then_authenticate() {
        let (backend, identity, user_id) = setup(3600).await;

        let issued = identity.login("alice", "hunter2hunter2".into()).await.unwrap();
        let principal = identity.authenticate(&issued.token).await.unwrap();

        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.user.name, "alice");
        assert_eq!(backend.inner().history_len(user_id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let (_backend, identity, _) = setup(3600).await;

        assert!(matches!(
            identity.login("alice", "wrong-password".into()).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            identity.login("nobody", "hunter2hunter2".into()).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let (_backend, identity, _) = setup(3600).await;
        let issued = identity.login("alice", "hunter2hunter2".into()).await.unwrap();
        let principal = identity.authenticate(&issued.token).await.unwrap();

        identity.logout(&principal).await.unwrap();

        assert!(matches!(
            identity.authenticate(&issued.token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_history_failure_does_not_block_request() {
        let (backend, identity, user_id) = setup(3600).await;
        let issued = identity.login("alice", "hunter2hunter2".into()).await.unwrap();
        backend.fail("append_history");
        backend.fail("touch_session");

        let principal = identity.authenticate(&issued.token).await.unwrap();
        assert_eq!(principal.user_id, user_id);
    }

    #[tokio::test]
    async fn test_deleted_user_token_rejected() {
        let (backend, identity, user_id) = setup(3600).await;
        let issued = identity.login("alice", "hunter2hunter2".into()).await.unwrap();
        backend.inner().delete_user(user_id).await.unwrap();

        assert!(matches!(
            identity.authenticate(&issued.token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_removed() {
        let (backend, identity, _) = setup(0).await;
        let issued = identity.login("alice", "hunter2hunter2".into()).await.unwrap();
        let claims = identity.tokens.verify(&issued.token).unwrap();
        let session_id = SessionId::parse(&claims.sid).unwrap();
        assert!(backend.inner().get_session(session_id).await.is_ok());

        assert!(matches!(
            identity.authenticate(&issued.token).await,
            Err(AppError::Unauthorized)
        ));
        assert!(
            backend
                .inner()
                .get_session(session_id)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
