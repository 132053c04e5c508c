//! Session store: current user identity and credential token.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::models::{AuthResponse, LoginRequest, SignupRequest, User};
use tracing::{info, warn};

use crate::{
    error::{ClientError, ClientResult},
    gateway::AuthBackend,
    storage::KeyValueStore,
};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the JSON-encoded user.
pub const USER_KEY: &str = "user";

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The signed-in user.
    pub user: User,
    /// Bearer token for REST calls and the live channel.
    pub token: String,
}

/// Observable session lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Storage has not been read yet.
    #[default]
    Loading,
    /// No usable credentials.
    Anonymous,
    /// Signed in.
    Authenticated(Session),
}

impl SessionState {
    /// The session when authenticated.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Whether storage is still unread.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Holds the session and keeps it in sync with durable storage and the gateway
/// token. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    backend: Arc<dyn AuthBackend>,
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    /// Create a store in the [`SessionState::Loading`] state.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            storage,
            backend,
            state: Arc::new(RwLock::new(SessionState::Loading)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Snapshot of the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    /// The current session, if authenticated.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read().session().cloned()
    }

    /// The current bearer token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read().session().map(|session| session.token.clone())
    }

    /// Restore the session from storage.
    ///
    /// A stored user that no longer parses, or a token or user stored without
    /// its counterpart, is treated as logged out and both entries are removed.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when storage cannot be read.
    pub fn rehydrate(&self) -> ClientResult<SessionState> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;

        let next = match (token, user) {
            (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => SessionState::Authenticated(Session { user, token }),
                Err(err) => {
                    warn!(error = %err, "stored user is corrupted; clearing session");
                    self.clear_storage()?;
                    SessionState::Anonymous
                }
            },
            (None, None) => SessionState::Anonymous,
            (token, user) => {
                warn!(
                    has_token = token.is_some(),
                    has_user = user.is_some(),
                    "incomplete stored session; clearing session"
                );
                self.clear_storage()?;
                SessionState::Anonymous
            }
        };

        self.backend
            .set_token(next.session().map(|session| session.token.clone()));
        if let Some(session) = next.session() {
            info!(user = %session.user.username, "session restored");
        }
        *self.write() = next.clone();
        Ok(next)
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    /// Returns the gateway error unchanged; no state changes on failure.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let response = self
            .backend
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.establish(response)
    }

    /// Register a new account and persist the resulting session.
    ///
    /// # Errors
    /// Returns the gateway error unchanged; no state changes on failure.
    pub async fn signup(&self, email: &str, password: &str, username: &str) -> ClientResult<Session> {
        let response = self
            .backend
            .signup(&SignupRequest {
                email: email.to_string(),
                password: password.to_string(),
                username: username.to_string(),
            })
            .await?;
        self.establish(response)
    }

    /// Invalidate the server session best-effort, then clear local state.
    ///
    /// Server failures are logged and never surfaced.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] when the stored entries cannot be
    /// removed; in-memory state is cleared regardless.
    pub async fn logout(&self) -> ClientResult<()> {
        if self.current().is_some()
            && let Err(err) = self.backend.logout().await
        {
            warn!(error = %err, "server logout failed; clearing local session anyway");
        }

        self.backend.set_token(None);
        *self.write() = SessionState::Anonymous;
        info!("session cleared");
        self.clear_storage()
    }

    fn establish(&self, response: AuthResponse) -> ClientResult<Session> {
        let session = Session {
            user: response.data,
            token: response.token,
        };

        self.storage.set(TOKEN_KEY, &session.token)?;
        self.storage
            .set(USER_KEY, &serde_json::to_string(&session.user)?)?;
        self.backend.set_token(Some(session.token.clone()));
        *self.write() = SessionState::Authenticated(session.clone());

        info!(user = %session.user.username, "session established");
        Ok(session)
    }

    fn clear_storage(&self) -> ClientResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        Ok(())
    }

    /// Require an authenticated session.
    ///
    /// # Errors
    /// Returns [`ClientError::NotAuthenticated`] otherwise.
    pub fn require(&self) -> ClientResult<Session> {
        self.current().ok_or(ClientError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use shared::models::UserId;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Default)]
    struct FakeBackend {
        token: Mutex<Option<String>>,
        logout_calls: AtomicUsize,
        fail_logout: bool,
    }

    fn user(id: &str, name: &str) -> User {
        serde_json::from_value(serde_json::json!({"_id": id, "username": name})).unwrap()
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        fn set_token(&self, token: Option<String>) {
            *self.token.lock().unwrap() = token;
        }

        async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
            if request.password == "GoodPass1" {
                Ok(AuthResponse {
                    data: user("u1", "ada"),
                    token: "tok-1".into(),
                    message: String::new(),
                })
            } else {
                Err(ClientError::api(
                    StatusCode::UNAUTHORIZED,
                    "Invalid email or password",
                ))
            }
        }

        async fn signup(&self, request: &SignupRequest) -> ClientResult<AuthResponse> {
            Ok(AuthResponse {
                data: user("u2", &request.username),
                token: "tok-2".into(),
                message: String::new(),
            })
        }

        async fn logout(&self) -> ClientResult<()> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_logout {
                Err(ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, "boom"))
            } else {
                Ok(())
            }
        }
    }

    fn store_with(backend: FakeBackend) -> (SessionStore, Arc<MemoryStore>, Arc<FakeBackend>) {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(backend);
        let store = SessionStore::new(storage.clone(), backend.clone());
        (store, storage, backend)
    }

    #[test]
    fn starts_loading_then_anonymous_on_empty_storage() {
        let (store, _, _) = store_with(FakeBackend::default());
        assert!(store.state().is_loading());

        assert_eq!(store.rehydrate().unwrap(), SessionState::Anonymous);
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn login_persists_and_sets_gateway_token() {
        let (store, storage, backend) = store_with(FakeBackend::default());
        store.rehydrate().unwrap();

        let session = store.login("user@example.com", "GoodPass1").await.unwrap();

        assert_eq!(session.user.id, UserId::from("u1"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
        assert!(storage.get(USER_KEY).unwrap().unwrap().contains("\"_id\":\"u1\""));
        assert_eq!(backend.token.lock().unwrap().as_deref(), Some("tok-1"));
        assert_eq!(store.token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn failed_login_leaves_state_untouched() {
        let (store, storage, _) = store_with(FakeBackend::default());
        store.rehydrate().unwrap();

        let err = store.login("user@example.com", "wrong").await.unwrap_err();

        assert!(err.is_auth());
        assert_eq!(err.user_message(), "Invalid email or password");
        assert_eq!(store.state(), SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn rehydrate_restores_persisted_session() {
        let (store, storage, backend) = store_with(FakeBackend::default());
        store.signup("new@example.com", "GoodPass1", "newbie").await.unwrap();

        let restored = SessionStore::new(storage.clone(), backend.clone());
        let state = restored.rehydrate().unwrap();

        let session = state.session().unwrap();
        assert_eq!(session.user.username, "newbie");
        assert_eq!(session.token, "tok-2");
    }

    #[test]
    fn corrupted_user_is_cleared() {
        let (store, storage, backend) = store_with(FakeBackend::default());
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, "{not json").unwrap();

        assert_eq!(store.rehydrate().unwrap(), SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(storage.get(USER_KEY).unwrap().is_none());
        assert!(backend.token.lock().unwrap().is_none());
    }

    #[test]
    fn token_without_user_is_anonymous_and_cleared() {
        let (store, storage, backend) = store_with(FakeBackend::default());
        storage.set(TOKEN_KEY, "tok").unwrap();

        assert_eq!(store.rehydrate().unwrap(), SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(backend.token.lock().unwrap().is_none());
    }

    #[test]
    fn user_without_token_is_anonymous_and_cleared() {
        let (store, storage, _) = store_with(FakeBackend::default());
        storage
            .set(USER_KEY, r#"{"_id":"u1","username":"ada"}"#)
            .unwrap();

        assert_eq!(store.rehydrate().unwrap(), SessionState::Anonymous);
        assert!(storage.get(USER_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let (store, storage, backend) = store_with(FakeBackend {
            fail_logout: true,
            ..FakeBackend::default()
        });
        store.login("user@example.com", "GoodPass1").await.unwrap();

        store.logout().await.unwrap();

        assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.state(), SessionState::Anonymous);
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(storage.get(USER_KEY).unwrap().is_none());
        assert!(backend.token.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_without_session_skips_server_call() {
        let (store, _, backend) = store_with(FakeBackend::default());
        store.rehydrate().unwrap();

        store.logout().await.unwrap();

        assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(store.require(), Err(ClientError::NotAuthenticated)));
    }
}
