//! Mock Garmin services shared by the scenario tests

use crate::auth::{OAuth1Token, OAuth2Token, StoredTokens, TokenStore, UserProfile};
use crate::config::{ClientConfig, Endpoints};
use crate::retry::RetryPolicy;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMAIL: &str = "runner@example.com";
pub const PASSWORD: &str = "hunter2";
pub const DISPLAY_NAME: &str = "runner42";
pub const PROFILE_ID: u64 = 9001;

pub const PREAUTHORIZED_PATH: &str = "/oauth-service/oauth/preauthorized";
pub const EXCHANGE_PATH: &str = "/oauth-service/oauth/exchange/user/2.0";
pub const PROFILE_PATH: &str = "/userprofile-service/socialProfile";

/// Config pointing every service at `server`, with millisecond backoff
pub fn config_for(server: &MockServer, token_dir: &Path) -> ClientConfig {
    let mut config = ClientConfig::new(token_dir);
    config.endpoints = Endpoints::single_host(server.uri());
    config.timeout = Duration::from_secs(5);
    config.retry = RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
    };
    config
}

pub async fn mount_consumer(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/oauth_consumer.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "consumer_key": "ck",
            "consumer_secret": "cs"
        })))
        .expect(expected)
        .named("consumer")
        .mount(server)
        .await;
}

/// Embed page, sign-in form and a credential POST that yields a ticket
pub async fn mount_sso(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/sso/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(expected)
        .named("sso embed")
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/signin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<input type="hidden" name="_csrf" value="csrf-token" />"#),
        )
        .expect(expected)
        .named("sso signin form")
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sso/signin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script>var u = "embed?ticket=ST-1-mock";</script>"#),
        )
        .expect(expected)
        .named("sso credential post")
        .mount(server)
        .await;
}

pub async fn mount_preauthorized(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path(PREAUTHORIZED_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=oauth1-token&oauth_token_secret=oauth1-secret"),
        )
        .expect(expected)
        .named("preauthorized")
        .mount(server)
        .await;
}

pub fn token_response(access_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "refresh_token": "refresh",
        "token_type": "Bearer",
        "expires_in": 3600,
        "refresh_token_expires_in": 7200
    }))
}

pub async fn mount_exchange(server: &MockServer, access_token: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path(EXCHANGE_PATH))
        .respond_with(token_response(access_token))
        .expect(expected)
        .named("oauth2 exchange")
        .mount(server)
        .await;
}

pub async fn mount_profile(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path(PROFILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayName": DISPLAY_NAME,
            "profileId": PROFILE_ID
        })))
        .expect(expected)
        .named("profile")
        .mount(server)
        .await;
}

/// Every step of a first-time login, each expected `expected` times
pub async fn mount_full_login(server: &MockServer, access_token: &str, expected: u64) {
    mount_consumer(server, expected).await;
    mount_sso(server, expected).await;
    mount_preauthorized(server, expected).await;
    mount_exchange(server, access_token, expected).await;
    mount_profile(server, expected).await;
}

pub fn oauth1() -> OAuth1Token {
    OAuth1Token {
        oauth_token: "stored-oauth1".to_string(),
        oauth_token_secret: "stored-secret".to_string(),
    }
}

pub fn oauth2(access_token: &str, expires_at: i64) -> OAuth2Token {
    OAuth2Token {
        access_token: access_token.to_string(),
        refresh_token: "stored-refresh".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        expires_at,
        refresh_token_expires_in: 7200,
        refresh_token_expires_at: expires_at + 3600,
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        display_name: DISPLAY_NAME.to_string(),
        profile_id: PROFILE_ID,
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn persist(dir: &Path, tokens: StoredTokens) {
    TokenStore::new(dir).save(&tokens).unwrap();
}
