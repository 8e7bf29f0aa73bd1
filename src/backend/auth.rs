use super::error::error_message;
use super::{read_json, AuthFailure, BackendError, BackendResult, IdentityService};
use crate::config::BackendConfig;
use crate::models::AuthUser;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInRequest {
    pub email: String,
    pub password: String,
    pub return_secure_token: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
}

/// Secure-token exchange uses snake_case keys, unlike the accounts API.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

impl SignInResponse {
    pub fn into_user(self) -> AuthUser {
        AuthUser {
            uid: self.local_id,
            email: self.email,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}

impl RefreshResponse {
    pub fn into_user(self, previous: &AuthUser) -> AuthUser {
        AuthUser {
            uid: self.user_id,
            email: previous.email.clone(),
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}

/// Email/password identity service over REST.
#[derive(Clone, Debug)]
pub(crate) struct IdentityClient {
    config: BackendConfig,
}

impl IdentityClient {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> BackendResult<&str> {
        let key = self.config.api_key.trim();
        if key.is_empty() {
            Err(BackendError::Config("api key"))
        } else {
            Ok(key)
        }
    }

    pub(crate) fn accounts_url(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.config.auth_url, method)
    }

    pub(crate) fn token_url(&self) -> String {
        format!("{}/token", self.config.token_url)
    }
}

/// Identity-service rejections come back as 400 with an error code.
async fn read_auth_json(
    res: reqwest::Response,
    context: &'static str,
) -> BackendResult<serde_json::Value> {
    if res.status().as_u16() == 400 {
        let body = res.text().await.unwrap_or_default();
        let code = error_message(&body).unwrap_or_default();
        return Err(BackendError::Auth(AuthFailure::from_code(&code)));
    }
    read_json(res, context).await
}

impl IdentityService for IdentityClient {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        let key = self.api_key()?;
        let res = reqwest::Client::new()
            .post(self.accounts_url("signInWithPassword"))
            .query(&[("key", key)])
            .json(&SignInRequest {
                email: email.to_string(),
                password: password.to_string(),
                return_secure_token: true,
            })
            .send()
            .await?;

        let data = read_auth_json(res, "Sign-in failed").await?;
        let parsed: SignInResponse = serde_json::from_value(data).map_err(BackendError::parse)?;
        Ok(parsed.into_user())
    }

    async fn lookup(&self, user: &AuthUser) -> BackendResult<()> {
        let key = self.api_key()?;
        let res = reqwest::Client::new()
            .post(self.accounts_url("lookup"))
            .query(&[("key", key)])
            .json(&serde_json::json!({ "idToken": user.id_token }))
            .send()
            .await?;

        let data = read_auth_json(res, "Account lookup failed").await?;
        let known = data
            .get("users")
            .and_then(|v| v.as_array())
            .is_some_and(|users| !users.is_empty());
        if known {
            Ok(())
        } else {
            Err(BackendError::Auth(AuthFailure::SessionExpired))
        }
    }

    async fn refresh(&self, user: &AuthUser) -> BackendResult<AuthUser> {
        let key = self.api_key()?;
        if user.refresh_token.trim().is_empty() {
            return Err(BackendError::Auth(AuthFailure::SessionExpired));
        }

        let res = reqwest::Client::new()
            .post(self.token_url())
            .query(&[("key", key)])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", user.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let data = read_auth_json(res, "Token refresh failed").await?;
        let parsed: RefreshResponse = serde_json::from_value(data).map_err(BackendError::parse)?;
        Ok(parsed.into_user(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_request_serialization() {
        let req = SignInRequest {
            email: "ana@example.com".to_string(),
            password: "secreto".to_string(),
            return_secure_token: true,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["email"], "ana@example.com");
        assert_eq!(v["returnSecureToken"], true);
    }

    #[test]
    fn test_sign_in_response_contract_deserialize() {
        let json = r#"{
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "uid-1",
            "email": "ana@example.com",
            "displayName": "",
            "idToken": "id-token",
            "registered": true,
            "refreshToken": "refresh-token",
            "expiresIn": "3600"
        }"#;
        let parsed: SignInResponse =
            serde_json::from_str(json).expect("sign-in response should parse");
        let user = parsed.into_user();
        assert_eq!(user.uid, "uid-1");
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.id_token, "id-token");
        assert_eq!(user.refresh_token, "refresh-token");
    }

    #[test]
    fn test_refresh_response_keeps_email() {
        let json = r#"{
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "r2",
            "id_token": "t2",
            "user_id": "uid-1",
            "project_id": "1234"
        }"#;
        let parsed: RefreshResponse =
            serde_json::from_str(json).expect("refresh response should parse");
        let previous = AuthUser {
            uid: "uid-1".to_string(),
            email: "ana@example.com".to_string(),
            id_token: "t1".to_string(),
            refresh_token: "r1".to_string(),
        };
        let user = parsed.into_user(&previous);
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.id_token, "t2");
        assert_eq!(user.refresh_token, "r2");
    }

    #[test]
    fn test_urls() {
        let mut config = BackendConfig::default();
        config.auth_url = "http://localhost:9099/identitytoolkit.googleapis.com/v1".to_string();
        let c = IdentityClient::new(config);
        assert_eq!(
            c.accounts_url("signInWithPassword"),
            "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword"
        );
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let mut config = BackendConfig::default();
        config.api_key = String::new();
        let c = IdentityClient::new(config);
        assert_eq!(c.api_key(), Err(BackendError::Config("api key")));
    }
}
