//! ============================================================================
//! Session Store - Authentication state and route gating
//! ============================================================================
//! Holds (token, user, loading). The user is set only after the token has
//! been validated by a successful profile fetch; any validation failure
//! clears token and user together, in memory and in persisted storage.
//!
//! Identity comes from the server (`GET /users/profile`), never from decoding
//! the token client-side.
//! ============================================================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::auth::Registration;
use crate::api::{ApiClient, ApiError};
use crate::db::LocalStore;
use crate::types::User;

/// Route-guard decision for protected surfaces.
///
/// `Pending` means the startup restore has not resolved yet: the caller must
/// treat the session as unknown, not as unauthenticated, and hold rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Pending,
    Denied,
    Granted,
}

pub struct SessionStore {
    api: Arc<ApiClient>,
    store: Arc<LocalStore>,
    token: Option<String>,
    user: Option<User>,
    loading: bool,
}

impl SessionStore {
    /// A fresh session starts in the loading state until `restore` resolves
    /// the persisted token one way or the other.
    pub fn new(api: Arc<ApiClient>, store: Arc<LocalStore>) -> Self {
        Self {
            api,
            store,
            token: None,
            user: None,
            loading: true,
        }
    }

    /// Startup restore: validate any persisted token, discarding it if the
    /// profile fetch fails. Always ends the loading state.
    pub async fn restore(&mut self) {
        let token = match self.store.load_token() {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read stored auth token: {}", e);
                None
            }
        };

        if let Some(token) = token {
            if let Err(e) = self.authenticate(token).await {
                warn!("Stored token is no longer valid: {}", e);
            }
        }
        self.loading = false;
    }

    /// Accept an opaque bearer token: persist it, then resolve the identity
    /// behind it. On profile-fetch failure the token is discarded from memory
    /// and storage and the session stays unauthenticated. Either way the
    /// session is resolved afterwards and `guard` stops answering `Pending`.
    pub async fn authenticate(&mut self, token: String) -> Result<(), ApiError> {
        self.complete_sign_in(Ok(token)).await
    }

    /// Customer credential login. A failed call leaves the session exactly
    /// as it was, but resolved.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        let token = self.api.login(email, password).await;
        self.complete_sign_in(token).await
    }

    /// Admin credential login against the dedicated endpoint.
    pub async fn login_admin(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        let token = self.api.login_admin(email, password).await;
        self.complete_sign_in(token).await
    }

    /// Create an account and authenticate the returned token right away, so
    /// a new account lands signed in. This is the single post-registration
    /// policy for the whole client.
    pub async fn register(&mut self, registration: &Registration) -> Result<(), ApiError> {
        let token = self.api.register(registration).await;
        self.complete_sign_in(token).await
    }

    /// Every sign-in attempt ends here, so any outcome leaves the session in
    /// a known state: loading means "restoration unresolved", never
    /// "signed in but still pending".
    async fn complete_sign_in(&mut self, token: Result<String, ApiError>) -> Result<(), ApiError> {
        let outcome = match token {
            Ok(token) => self.validate_token(token).await,
            Err(e) => Err(e),
        };
        self.loading = false;
        outcome
    }

    async fn validate_token(&mut self, token: String) -> Result<(), ApiError> {
        if let Err(e) = self.store.save_token(&token) {
            warn!("Failed to persist auth token, continuing in memory: {}", e);
        }
        self.token = Some(token);

        match self.api.user_profile().await {
            Ok(user) => {
                info!("Signed in as {}", user.email);
                self.user = Some(user);
                Ok(())
            }
            Err(e) => {
                self.clear_session();
                Err(e)
            }
        }
    }

    /// Clear token, user, and persisted storage.
    pub fn logout(&mut self) {
        self.clear_session();
        info!("Logged out");
    }

    fn clear_session(&mut self) {
        self.token = None;
        self.user = None;
        if let Err(e) = self.store.clear_token() {
            warn!("Failed to clear persisted auth token: {}", e);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Gate a protected surface. While the restore is in flight the answer
    /// is `Pending`; afterwards, missing authentication or a missing exact
    /// role match resolves to `Denied` (handled by redirect, never by error).
    pub fn guard(&self, required_role: Option<&str>) -> RouteAccess {
        if self.loading {
            return RouteAccess::Pending;
        }
        let Some(user) = &self.user else {
            return RouteAccess::Denied;
        };
        if let Some(role) = required_role {
            if !user.has_role(role) {
                return RouteAccess::Denied;
            }
        }
        RouteAccess::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_server, temp_store, MockResponse};

    const PROFILE_JSON: &str = r#"{ "email": "a@x.com", "name": "Alice", "roles": ["CLIENT"] }"#;
    const ADMIN_PROFILE_JSON: &str = r#"{ "email": "root@x.com", "roles": ["ADMIN"] }"#;

    fn session_against(base_url: &str) -> (tempfile::TempDir, Arc<LocalStore>, SessionStore) {
        let (dir, store) = temp_store();
        let api = Arc::new(ApiClient::with_base_url(base_url, Arc::clone(&store)));
        let session = SessionStore::new(api, Arc::clone(&store));
        (dir, store, session)
    }

    #[tokio::test]
    async fn test_login_success_authenticates_and_persists_token() {
        let (base_url, handle) = spawn_server(vec![
            MockResponse::json(200, r#"{ "token": "jwt-1" }"#),
            MockResponse::json(200, PROFILE_JSON),
        ]);
        let (_dir, store, mut session) = session_against(&base_url);

        session.login("a@x.com", "secret").await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().email, "a@x.com");
        assert_eq!(session.token(), Some("jwt-1"));
        assert_eq!(store.load_token().unwrap().as_deref(), Some("jwt-1"));

        // The profile fetch carried the freshly persisted token.
        let requests = handle.join().unwrap();
        assert_eq!(requests[1].url, "/users/profile");
        assert_eq!(requests[1].authorization.as_deref(), Some("Bearer jwt-1"));
    }

    #[tokio::test]
    async fn test_login_rejection_leaves_session_unchanged() {
        let (base_url, handle) = spawn_server(vec![MockResponse::json(
            401,
            r#"{ "message": "Invalid email or password" }"#,
        )]);
        let (_dir, store, mut session) = session_against(&base_url);

        let err = session.login("a@x.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(store.load_token().unwrap().is_none());
        // A resolved attempt ends the loading state even on rejection.
        assert!(!session.is_loading());
        assert_eq!(session.guard(None), RouteAccess::Denied);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_guard_granted_after_login_without_restore() {
        let (base_url, handle) = spawn_server(vec![
            MockResponse::json(200, r#"{ "token": "jwt-1" }"#),
            MockResponse::json(200, PROFILE_JSON),
        ]);
        let (_dir, _store, mut session) = session_against(&base_url);

        // A fresh session that signs in directly must not stay pending.
        session.login("a@x.com", "secret").await.unwrap();
        assert!(!session.is_loading());
        assert_eq!(session.guard(None), RouteAccess::Granted);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_profile_failure_discards_token_atomically() {
        let (base_url, handle) = spawn_server(vec![
            MockResponse::json(200, r#"{ "token": "jwt-1" }"#),
            MockResponse::json(401, r#"{ "message": "Token expired" }"#),
        ]);
        let (_dir, store, mut session) = session_against(&base_url);

        assert!(session.login("a@x.com", "secret").await.is_err());
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert!(store.load_token().unwrap().is_none());
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_register_auto_authenticates() {
        let (base_url, handle) = spawn_server(vec![
            MockResponse::json(200, r#"{ "token": "jwt-new" }"#),
            MockResponse::json(200, PROFILE_JSON),
        ]);
        let (_dir, _store, mut session) = session_against(&base_url);

        let registration = Registration {
            nom: "Durand".into(),
            prenom: "Alice".into(),
            email: "a@x.com".into(),
            telephone: "0600000000".into(),
            password: "secret".into(),
        };
        session.register(&registration).await.unwrap();
        assert!(session.is_authenticated());
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_restore_validates_persisted_token() {
        let (base_url, handle) = spawn_server(vec![MockResponse::json(200, ADMIN_PROFILE_JSON)]);
        let (_dir, store, mut session) = session_against(&base_url);
        store.save_token("jwt-stored").unwrap();

        assert!(session.is_loading());
        session.restore().await;
        assert!(!session.is_loading());
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().email, "root@x.com");
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_restore_without_token_resolves_unauthenticated() {
        // No server needed: restore must not call anything without a token.
        let (_dir, store) = temp_store();
        let api = Arc::new(ApiClient::with_base_url("http://127.0.0.1:9", Arc::clone(&store)));
        let mut session = SessionStore::new(api, store);

        session.restore().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_with_stale_token_clears_storage() {
        let (base_url, handle) =
            spawn_server(vec![MockResponse::json(401, r#"{ "message": "expired" }"#)]);
        let (_dir, store, mut session) = session_against(&base_url);
        store.save_token("jwt-stale").unwrap();

        session.restore().await;
        assert!(!session.is_authenticated());
        assert!(store.load_token().unwrap().is_none());
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_logout_clears_persisted_token() {
        let (base_url, handle) = spawn_server(vec![
            MockResponse::json(200, r#"{ "token": "jwt-1" }"#),
            MockResponse::json(200, PROFILE_JSON),
        ]);
        let (_dir, store, mut session) = session_against(&base_url);

        session.login("a@x.com", "secret").await.unwrap();
        session.logout();
        assert!(!session.is_authenticated());
        assert!(store.load_token().unwrap().is_none());
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_guard_pending_while_loading() {
        let (_dir, store) = temp_store();
        let api = Arc::new(ApiClient::with_base_url("http://127.0.0.1:9", Arc::clone(&store)));
        let session = SessionStore::new(api, store);

        // Loading means "unknown", never "unauthenticated".
        assert_eq!(session.guard(None), RouteAccess::Pending);
        assert_eq!(session.guard(Some("ADMIN")), RouteAccess::Pending);
    }

    #[tokio::test]
    async fn test_guard_role_check_is_exact() {
        let (base_url, handle) = spawn_server(vec![
            MockResponse::json(200, r#"{ "token": "jwt-1" }"#),
            MockResponse::json(
                200,
                r#"{ "email": "a@x.com", "roles": ["ADMINISTRATOR"] }"#,
            ),
        ]);
        let (_dir, _store, mut session) = session_against(&base_url);
        session.login("a@x.com", "secret").await.unwrap();

        assert_eq!(session.guard(None), RouteAccess::Granted);
        // Substring of a held role must not pass an exact-match check.
        assert_eq!(session.guard(Some("ADMIN")), RouteAccess::Denied);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_guard_denies_unauthenticated_after_restore() {
        let (_dir, store) = temp_store();
        let api = Arc::new(ApiClient::with_base_url("http://127.0.0.1:9", Arc::clone(&store)));
        let mut session = SessionStore::new(api, store);

        session.restore().await;
        assert_eq!(session.guard(None), RouteAccess::Denied);
    }
}
