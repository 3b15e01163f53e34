//! Ticket → OAuth1 → OAuth2 exchanges and the profile lookup

use crate::auth::oauth1::OAuth1Signer;
use crate::auth::types::OAuth2TokenResponse;
use crate::auth::{ConsumerCredentials, OAuth1Token, OAuth2Token, UserProfile};
use crate::config::{Endpoints, USER_AGENT_MOBILE};
use crate::error::AppError;
use crate::http::success_text;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Trade an SSO ticket for a long-lived OAuth1 token
pub async fn ticket_for_oauth1(
    client: &reqwest::Client,
    endpoints: &Endpoints,
    consumer: &ConsumerCredentials,
    ticket: &str,
) -> Result<OAuth1Token, AppError> {
    let url = Url::parse_with_params(
        &endpoints.oauth_preauthorized(),
        &[
            ("ticket", ticket),
            ("login-url", endpoints.sso_embed().as_str()),
            ("accepts-mfa-tokens", "true"),
        ],
    )?;
    let authorization = OAuth1Signer::new(consumer, None).authorization_header("GET", &url)?;

    debug!("Exchanging SSO ticket for OAuth1 token");
    let response = client
        .get(url)
        .header(AUTHORIZATION, authorization)
        .header(USER_AGENT, USER_AGENT_MOBILE)
        .send()
        .await?;
    let body = success_text(response).await?;

    parse_oauth1_body(&body)
}

fn parse_oauth1_body(body: &str) -> Result<OAuth1Token, AppError> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match key.as_ref() {
            "oauth_token" if !value.is_empty() => token = Some(value.into_owned()),
            "oauth_token_secret" if !value.is_empty() => secret = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(OAuth1Token {
        oauth_token: token.ok_or_else(|| AppError::MissingArtifact("oauth_token".to_string()))?,
        oauth_token_secret: secret
            .ok_or_else(|| AppError::MissingArtifact("oauth_token_secret".to_string()))?,
    })
}

/// Mint a fresh OAuth2 bearer token from the OAuth1 token.
/// The OAuth1 authorization goes in the query string, the body is empty.
pub async fn oauth1_for_oauth2(
    client: &reqwest::Client,
    endpoints: &Endpoints,
    consumer: &ConsumerCredentials,
    oauth1: &OAuth1Token,
) -> Result<OAuth2Token, AppError> {
    let mut url = Url::parse(&endpoints.oauth_exchange())?;
    let params = OAuth1Signer::new(consumer, Some(oauth1)).authorize("POST", &url)?;
    url.query_pairs_mut().extend_pairs(params.iter());

    debug!("Exchanging OAuth1 token for OAuth2 token");
    let response = client
        .post(url)
        .header(USER_AGENT, USER_AGENT_MOBILE)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .send()
        .await?;
    let body = success_text(response).await?;

    let token: OAuth2TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AppError::Parse(format!("Invalid OAuth2 token response: {}", e)))?;
    Ok(OAuth2Token::from_response(token, chrono::Utc::now().timestamp()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialProfile {
    display_name: Option<String>,
    profile_id: Option<u64>,
    user_profile_number: Option<u64>,
}

/// Resolve the account's display name and numeric profile id
pub async fn fetch_profile(
    client: &reqwest::Client,
    endpoints: &Endpoints,
    oauth2: &OAuth2Token,
) -> Result<UserProfile, AppError> {
    debug!("Fetching user profile");
    let response = client
        .get(endpoints.profile())
        .bearer_auth(&oauth2.access_token)
        .header(USER_AGENT, USER_AGENT_MOBILE)
        .send()
        .await?;
    let body = success_text(response).await?;

    let profile: SocialProfile = serde_json::from_str(&body)
        .map_err(|e| AppError::Parse(format!("Invalid profile response: {}", e)))?;

    let display_name = profile
        .display_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::MissingArtifact("display name".to_string()))?;

    Ok(UserProfile {
        display_name,
        profile_id: profile.profile_id.or(profile.user_profile_number).unwrap_or(0),
    })
}
