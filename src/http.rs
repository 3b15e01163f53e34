//! HTTP client construction
//!
//! Two clients are used: a plain API client carrying the mobile-app
//! User-Agent, and a cookie-jar client that looks like a desktop browser
//! for the SSO login pages. Both honor the system proxy variables.

use crate::config::{USER_AGENT_BROWSER, USER_AGENT_MOBILE};
use crate::error::AppError;
use reqwest::{Client, ClientBuilder, Proxy, Response};
use std::time::Duration;
use url::Url;

/// Client for OAuth exchanges and authenticated API calls
pub fn api_client(timeout: Duration) -> Result<Client, AppError> {
    with_system_proxy(Client::builder().timeout(timeout))
        .user_agent(USER_AGENT_MOBILE)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Client with its own cookie jar, for one SSO login attempt
pub fn sso_client(timeout: Duration) -> Result<Client, AppError> {
    with_system_proxy(Client::builder().timeout(timeout))
        .cookie_store(true)
        .user_agent(USER_AGENT_BROWSER)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create SSO client: {}", e)))
}

/// Read the body of a successful response, or turn a non-2xx response into
/// `AppError::Http` with status and body preserved
pub async fn success_text(response: Response) -> Result<String, AppError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(AppError::http(status, body));
    }
    Ok(body)
}

/// Recognized env vars:
/// - HTTP_PROXY / http_proxy
/// - HTTPS_PROXY / https_proxy
/// - ALL_PROXY / all_proxy
/// - NO_PROXY / no_proxy
fn with_system_proxy(builder: ClientBuilder) -> ClientBuilder {
    let https_proxy = getenv_first(&["HTTPS_PROXY", "https_proxy"])
        .or_else(|| getenv_first(&["ALL_PROXY", "all_proxy"]));
    let http_proxy = getenv_first(&["HTTP_PROXY", "http_proxy"])
        .or_else(|| getenv_first(&["ALL_PROXY", "all_proxy"]));

    if https_proxy.is_none() && http_proxy.is_none() {
        return builder;
    }

    let no_proxy = parse_no_proxy(&getenv_first(&["NO_PROXY", "no_proxy"]).unwrap_or_default());
    let proxy = Proxy::custom(move |url: &Url| {
        if should_bypass_proxy(url.host_str().unwrap_or(""), &no_proxy) {
            return None;
        }
        match url.scheme() {
            "https" => https_proxy.clone().or_else(|| http_proxy.clone()),
            "http" => http_proxy.clone().or_else(|| https_proxy.clone()),
            _ => None,
        }
    });
    builder.proxy(proxy)
}

fn getenv_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq)]
enum NoProxyRule {
    Wildcard,
    /// Host or any subdomain of it
    Domain(String),
    /// Exact host (localhost, IP literals)
    Exact(String),
}

fn parse_no_proxy(val: &str) -> Vec<NoProxyRule> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|token| {
            if token == "*" {
                return NoProxyRule::Wildcard;
            }
            if let Some(domain) = token.strip_prefix('.') {
                return NoProxyRule::Domain(domain.to_ascii_lowercase());
            }
            let t = token.to_ascii_lowercase();
            if t == "localhost" || t.parse::<std::net::IpAddr>().is_ok() {
                NoProxyRule::Exact(t)
            } else {
                NoProxyRule::Domain(t)
            }
        })
        .collect()
}

fn should_bypass_proxy(host: &str, rules: &[NoProxyRule]) -> bool {
    if host.is_empty() {
        return false;
    }
    let host = host.to_ascii_lowercase();
    rules.iter().any(|rule| match rule {
        NoProxyRule::Wildcard => true,
        NoProxyRule::Exact(exact) => host == *exact,
        NoProxyRule::Domain(suffix) => {
            host == *suffix || host.ends_with(&format!(".{}", suffix))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_proxy_rules() {
        let rules = parse_no_proxy("localhost, .garmin.com,10.0.0.1,example.org,,*");
        assert_eq!(
            rules,
            vec![
                NoProxyRule::Exact("localhost".to_string()),
                NoProxyRule::Domain("garmin.com".to_string()),
                NoProxyRule::Exact("10.0.0.1".to_string()),
                NoProxyRule::Domain("example.org".to_string()),
                NoProxyRule::Wildcard,
            ]
        );
    }

    #[test]
    fn test_bypass_matches_subdomains() {
        let rules = parse_no_proxy(".garmin.com,localhost");
        assert!(should_bypass_proxy("sso.garmin.com", &rules));
        assert!(should_bypass_proxy("garmin.com", &rules));
        assert!(should_bypass_proxy("LOCALHOST", &rules));
        assert!(!should_bypass_proxy("notgarmin.com", &rules));
        assert!(!should_bypass_proxy("", &rules));
    }

    #[test]
    fn test_clients_build() {
        assert!(api_client(Duration::from_secs(5)).is_ok());
        assert!(sso_client(Duration::from_secs(5)).is_ok());
    }
}
