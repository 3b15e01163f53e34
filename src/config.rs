//! Endpoint set, token directory and request tuning

use crate::error::AppError;
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONSUMER_URL: &str = "https://thegarth.s3.amazonaws.com/oauth_consumer.json";
pub const DEFAULT_SSO_BASE: &str = "https://sso.garmin.com";
pub const DEFAULT_API_BASE: &str = "https://connectapi.garmin.com";

/// Seconds before `expires_at` at which an access token is already treated as expired
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

pub const USER_AGENT_MOBILE: &str = "com.garmin.android.apps.connectmobile";
pub const USER_AGENT_BROWSER: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const SSO_CLIENT_ID: &str = "GarminConnect";
pub const SSO_LOCALE: &str = "en";
pub const SSO_WIDGET_ID: &str = "gauth-widget";

const TOKEN_DIR_NAME: &str = ".garmin-mcp";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base URLs of the services the session talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub consumer_url: String,
    pub sso_base: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            consumer_url: DEFAULT_CONSUMER_URL.to_string(),
            sso_base: DEFAULT_SSO_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL (mock servers, gateways)
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            consumer_url: format!("{}/oauth_consumer.json", base),
            sso_base: base.clone(),
            api_base: base,
        }
    }

    pub fn sso_origin(&self) -> &str {
        self.sso_base.trim_end_matches('/')
    }

    pub fn sso_embed(&self) -> String {
        format!("{}/sso/embed", self.sso_origin())
    }

    pub fn sso_signin(&self) -> String {
        format!("{}/sso/signin", self.sso_origin())
    }

    pub fn api_root(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn oauth_preauthorized(&self) -> String {
        format!("{}/oauth-service/oauth/preauthorized", self.api_root())
    }

    pub fn oauth_exchange(&self) -> String {
        format!("{}/oauth-service/oauth/exchange/user/2.0", self.api_root())
    }

    pub fn profile(&self) -> String {
        format!("{}/userprofile-service/socialProfile", self.api_root())
    }
}

/// Complete client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub token_dir: PathBuf,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Defaults for the live service, storing tokens under `token_dir`
    pub fn new(token_dir: impl Into<PathBuf>) -> Self {
        Self {
            endpoints: Endpoints::default(),
            token_dir: token_dir.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Defaults overridden by `GARMIN_*` environment variables
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token_dir = match get("GARMIN_TOKEN_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_token_dir()?,
        };
        let mut config = Self::new(token_dir);

        if let Some(url) = get("GARMIN_CONSUMER_URL") {
            config.endpoints.consumer_url = url;
        }
        if let Some(url) = get("GARMIN_SSO_BASE") {
            config.endpoints.sso_base = url;
        }
        if let Some(url) = get("GARMIN_API_BASE") {
            config.endpoints.api_base = url;
        }
        if let Some(raw) = get("GARMIN_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("GARMIN_HTTP_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Get the per-user token directory (`~/.garmin-mcp`)
pub fn default_token_dir() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(TOKEN_DIR_NAME))
}
