use crate::config::TOKEN_EXPIRY_BUFFER_SECS;
use crate::error::AppError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared public key pair used to sign every OAuth1 request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// First-stage (OAuth1) token, only ever used to mint OAuth2 tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth1Token {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

/// Bearer token with absolute expiry timestamps (epoch seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub expires_at: i64,
    #[serde(default)]
    pub refresh_token_expires_in: i64,
    #[serde(default)]
    pub refresh_token_expires_at: i64,
}

/// Token endpoint response; lifetimes are relative
#[derive(Debug, Deserialize)]
pub(crate) struct OAuth2TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token_expires_in: i64,
}

impl OAuth2Token {
    /// Stamp absolute expiries onto a token response received at `now`
    pub(crate) fn from_response(response: OAuth2TokenResponse, now: i64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            expires_at: now + response.expires_in,
            refresh_token_expires_in: response.refresh_token_expires_in,
            refresh_token_expires_at: now + response.refresh_token_expires_in,
        }
    }

    /// Expired, or within the expiry buffer of expiring
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now + TOKEN_EXPIRY_BUFFER_SECS
    }
}

/// Account identifiers needed to build per-user endpoint paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    pub profile_id: u64,
}

/// Email and password for the SSO login form
#[derive(Clone, Default)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Asks the user for a second-factor code
pub type MfaPrompt = Arc<dyn Fn() -> BoxFuture<'static, Result<String, AppError>> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_at(expires_at: i64) -> OAuth2Token {
        OAuth2Token {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            expires_at,
            refresh_token_expires_in: 7200,
            refresh_token_expires_at: expires_at + 3600,
        }
    }

    #[test]
    fn test_token_not_expired_outside_buffer() {
        let now = 1_700_000_000;
        assert!(!token_expiring_at(now + 3600).is_expired_at(now));
        assert!(!token_expiring_at(now + TOKEN_EXPIRY_BUFFER_SECS + 1).is_expired_at(now));
    }

    #[test]
    fn test_token_expired_within_buffer() {
        let now = 1_700_000_000;
        assert!(token_expiring_at(now + TOKEN_EXPIRY_BUFFER_SECS).is_expired_at(now));
        assert!(token_expiring_at(now + 30).is_expired_at(now));
        assert!(token_expiring_at(now - 10).is_expired_at(now));
    }

    #[test]
    fn test_from_response_stamps_absolute_expiry() {
        let response: OAuth2TokenResponse = serde_json::from_str(
            r#"{"scope":"CONNECT_READ","jti":"x","access_token":"a","token_type":"Bearer",
                "refresh_token":"r","expires_in":3600,"refresh_token_expires_in":7200}"#,
        )
        .unwrap();

        let token = OAuth2Token::from_response(response, 1_000);
        assert_eq!(token.expires_at, 4_600);
        assert_eq!(token.refresh_token_expires_at, 8_200);
        assert_eq!(token.token_type, "Bearer");
    }

    #[test]
    fn test_profile_uses_camel_case_on_disk() {
        let profile = UserProfile {
            display_name: "runner42".to_string(),
            profile_id: 12345,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "runner42");
        assert_eq!(json["profileId"], 12345);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = LoginCredentials::new("me@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_completeness() {
        assert!(LoginCredentials::new("me@example.com", "pw").is_complete());
        assert!(!LoginCredentials::new("", "pw").is_complete());
        assert!(!LoginCredentials::new("me@example.com", "").is_complete());
        assert!(!LoginCredentials::default().is_complete());
    }
}
