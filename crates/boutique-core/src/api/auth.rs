//! Authentication endpoints: credential login (customer and admin),
//! registration, and the profile fetch that validates a bearer token.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiClient, ApiError};
use crate::types::{User, ROLE_CLIENT};

/// Fields collected by the registration form.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    #[serde(rename = "motDePasse")]
    pub password: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

impl ApiClient {
    /// `POST /auth/login` — credentials to opaque bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = json!({ "email": email, "motDePasse": password });
        let response: TokenResponse = self.post_json("/auth/login", body).await?;
        Ok(response.token)
    }

    /// `POST /auth/login/admin` — same contract, admin accounts only.
    pub async fn login_admin(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = json!({ "email": email, "motDePasse": password });
        let response: TokenResponse = self.post_json("/auth/login/admin", body).await?;
        Ok(response.token)
    }

    /// `POST /users` — create an account; the backend answers with a token.
    /// New accounts always register with the customer role.
    pub async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        let mut body = serde_json::to_value(registration)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        body["role"] = json!(ROLE_CLIENT);
        let response: TokenResponse = self.post_json("/users", body).await?;
        Ok(response.token)
    }

    /// `GET /users/profile` — resolve the identity behind the stored token.
    pub async fn user_profile(&self) -> Result<User, ApiError> {
        self.get_json("/users/profile").await
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{client_against, spawn_server, MockResponse};

    #[tokio::test]
    async fn test_login_returns_token() {
        let (base_url, handle) =
            spawn_server(vec![MockResponse::json(200, r#"{ "token": "jwt-1" }"#)]);
        let (_dir, client) = client_against(&base_url);

        let token = client.login("a@x.com", "secret").await.unwrap();
        assert_eq!(token, "jwt-1");

        let requests = handle.join().unwrap();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].url, "/auth/login");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["motDePasse"], "secret");
    }

    #[tokio::test]
    async fn test_register_sends_client_role() {
        let (base_url, handle) =
            spawn_server(vec![MockResponse::json(200, r#"{ "token": "jwt-2" }"#)]);
        let (_dir, client) = client_against(&base_url);

        let registration = super::Registration {
            nom: "Durand".into(),
            prenom: "Alice".into(),
            email: "alice@x.com".into(),
            telephone: "0600000000".into(),
            password: "secret".into(),
        };
        let token = client.register(&registration).await.unwrap();
        assert_eq!(token, "jwt-2");

        let requests = handle.join().unwrap();
        assert_eq!(requests[0].url, "/users");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["role"], "CLIENT");
        assert_eq!(body["motDePasse"], "secret");
        assert_eq!(body["prenom"], "Alice");
    }

    #[tokio::test]
    async fn test_profile_parses_user() {
        let (base_url, handle) = spawn_server(vec![MockResponse::json(
            200,
            r#"{ "email": "a@x.com", "name": "Alice", "roles": ["CLIENT"] }"#,
        )]);
        let (_dir, client) = client_against(&base_url);

        let user = client.user_profile().await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.roles, vec!["CLIENT"]);
        handle.join().unwrap();
    }
}
