//! Session controller
//!
//! Decides on every call whether the credentials in hand are good enough,
//! need a new OAuth2 token, or require a full SSO login. All decisions run
//! under one async mutex, so concurrent callers wait for a single in-flight
//! login or refresh instead of starting their own.

use crate::auth::consumer::ConsumerRegistry;
use crate::auth::exchange::{fetch_profile, oauth1_for_oauth2, ticket_for_oauth1};
use crate::auth::scrape::RegexExtractor;
use crate::auth::sso::SsoFlow;
use crate::auth::storage::{StoredTokens, TokenStore};
use crate::auth::{LoginCredentials, MfaPrompt, OAuth1Token, OAuth2Token, UserProfile};
use crate::config::ClientConfig;
use crate::error::AppError;
use std::sync::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the session stands, from nothing persisted to fully usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    HasStage1,
    HasStage2Expired,
    HasStage2Valid,
    HasProfile,
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionState {
    oauth1: Option<OAuth1Token>,
    oauth2: Option<OAuth2Token>,
    profile: Option<UserProfile>,
    authenticated: bool,
}

impl SessionState {
    fn from_stored(stored: StoredTokens) -> Self {
        Self {
            oauth1: stored.oauth1,
            oauth2: stored.oauth2,
            profile: stored.profile,
            authenticated: false,
        }
    }

    fn to_stored(&self) -> StoredTokens {
        StoredTokens {
            oauth1: self.oauth1.clone(),
            oauth2: self.oauth2.clone(),
            profile: self.profile.clone(),
        }
    }

    /// Access token that is not expired (buffer included)
    fn valid_access_token(&self, now: i64) -> Option<&str> {
        self.oauth2
            .as_ref()
            .filter(|t| !t.is_expired_at(now))
            .map(|t| t.access_token.as_str())
    }

    fn phase(&self, now: i64) -> SessionPhase {
        let valid = self.valid_access_token(now).is_some();
        match (&self.oauth2, valid, &self.profile) {
            (Some(_), true, Some(_)) if self.authenticated => SessionPhase::Authenticated,
            (Some(_), true, Some(_)) => SessionPhase::HasProfile,
            (Some(_), true, None) => SessionPhase::HasStage2Valid,
            (Some(_), false, _) => SessionPhase::HasStage2Expired,
            (None, _, _) if self.oauth1.is_some() => SessionPhase::HasStage1,
            (None, _, _) => SessionPhase::Empty,
        }
    }
}

/// Read-only view of the session for status displays
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub has_oauth1: bool,
    pub access_expires_at: Option<i64>,
    pub refresh_expires_at: Option<i64>,
    pub profile: Option<UserProfile>,
}

pub struct Session {
    credentials: LoginCredentials,
    mfa_prompt: Option<MfaPrompt>,
    config: ClientConfig,
    http: reqwest::Client,
    store: TokenStore,
    consumer: ConsumerRegistry,
    sso: SsoFlow,
    state: Mutex<SessionState>,
    identity: RwLock<Option<UserProfile>>,
}

impl Session {
    /// Build a session hydrated from the token directory in `config`
    pub fn new(
        credentials: LoginCredentials,
        mfa_prompt: Option<MfaPrompt>,
        http: reqwest::Client,
        config: ClientConfig,
    ) -> Result<Self, AppError> {
        let store = TokenStore::new(&config.token_dir);
        let stored = store.load();
        debug!(
            "Loaded persisted tokens (oauth1: {}, oauth2: {}, profile: {})",
            stored.oauth1.is_some(),
            stored.oauth2.is_some(),
            stored.profile.is_some()
        );

        let sso = SsoFlow::new(
            config.endpoints.clone(),
            config.timeout,
            Box::new(RegexExtractor::new()?),
        );

        Ok(Self {
            credentials,
            mfa_prompt,
            consumer: ConsumerRegistry::new(config.endpoints.consumer_url.clone()),
            http,
            store,
            sso,
            identity: RwLock::new(stored.profile.clone()),
            state: Mutex::new(SessionState::from_stored(stored)),
            config,
        })
    }

    /// Display name of the account, empty until known
    pub fn display_name(&self) -> String {
        self.identity()
            .map(|p| p.display_name)
            .unwrap_or_default()
    }

    /// Numeric profile id of the account, zero until known
    pub fn user_profile_pk(&self) -> u64 {
        self.identity().map(|p| p.profile_id).unwrap_or(0)
    }

    fn identity(&self) -> Option<UserProfile> {
        match self.identity.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase(now())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            phase: state.phase(now()),
            has_oauth1: state.oauth1.is_some(),
            access_expires_at: state.oauth2.as_ref().map(|t| t.expires_at),
            refresh_expires_at: state.oauth2.as_ref().map(|t| t.refresh_token_expires_at),
            profile: state.profile.clone(),
        }
    }

    /// Make sure a usable bearer token and profile exist; returns the access token
    pub async fn ensure_authenticated(&self) -> Result<String, AppError> {
        let mut state = self.state.lock().await;
        let now = now();

        if let Some(token) = state.valid_access_token(now).map(str::to_string) {
            if state.profile.is_none() {
                info!("OAuth2 token is valid, resolving profile");
                self.resolve_profile(&mut state).await?;
                self.persist(&state)?;
            } else if !state.authenticated {
                debug!("Using persisted OAuth2 token");
            }
            state.authenticated = true;
            return Ok(token);
        }

        state.authenticated = false;
        self.renew_or_login(&mut state).await
    }

    /// Recover from a rejected access token. If another caller already
    /// replaced `rejected_token`, the newer token is returned as is.
    pub async fn refresh_or_relogin(&self, rejected_token: &str) -> Result<String, AppError> {
        let mut state = self.state.lock().await;

        if state.authenticated {
            if let Some(current) = state.valid_access_token(now()) {
                if current != rejected_token {
                    debug!("Token already refreshed by a concurrent request");
                    return Ok(current.to_string());
                }
            }
        }

        state.authenticated = false;
        self.renew_or_login(&mut state).await
    }

    /// Reuse the OAuth1 token when there is one; fall back to a full login
    /// if the service rejects it or anything else in the renewal fails
    async fn renew_or_login(&self, state: &mut SessionState) -> Result<String, AppError> {
        if state.oauth1.is_some() {
            match self.renew_from_oauth1(state).await {
                Ok(()) => {
                    self.persist(state)?;
                    state.authenticated = true;
                    return self.current_token(state);
                }
                Err(e) => warn!("OAuth2 refresh failed, will re-login: {}", e),
            }
        }

        self.login(state).await?;
        state.authenticated = true;
        self.current_token(state)
    }

    async fn renew_from_oauth1(&self, state: &mut SessionState) -> Result<(), AppError> {
        let oauth1 = state
            .oauth1
            .clone()
            .ok_or_else(|| AppError::MissingArtifact("OAuth1 token".to_string()))?;

        info!("Exchanging OAuth1 token for a new OAuth2 token");
        let consumer = self.consumer.get(&self.http).await?;
        let oauth2 =
            oauth1_for_oauth2(&self.http, &self.config.endpoints, &consumer, &oauth1).await?;
        state.oauth2 = Some(oauth2);

        if state.profile.is_none() {
            self.resolve_profile(state).await?;
        }
        Ok(())
    }

    async fn login(&self, state: &mut SessionState) -> Result<(), AppError> {
        if !self.credentials.is_complete() {
            return Err(AppError::InvalidInput(
                "Email and password are required to log in; run `garmin-session login` or set GARMIN_EMAIL and GARMIN_PASSWORD".to_string(),
            ));
        }

        info!("Authenticating with Garmin Connect...");
        let endpoints = &self.config.endpoints;

        let consumer = self.consumer.get(&self.http).await?;
        let ticket = self
            .sso
            .login_ticket(&self.credentials, self.mfa_prompt.as_ref())
            .await?;
        let oauth1 = ticket_for_oauth1(&self.http, endpoints, &consumer, &ticket).await?;
        let oauth2 = oauth1_for_oauth2(&self.http, endpoints, &consumer, &oauth1).await?;

        state.oauth1 = Some(oauth1);
        state.oauth2 = Some(oauth2);
        self.resolve_profile(state).await?;
        self.persist(state)?;

        info!("Authentication successful");
        Ok(())
    }

    async fn resolve_profile(&self, state: &mut SessionState) -> Result<(), AppError> {
        let oauth2 = state
            .oauth2
            .as_ref()
            .ok_or_else(|| AppError::MissingArtifact("OAuth2 token".to_string()))?;
        let profile = fetch_profile(&self.http, &self.config.endpoints, oauth2).await?;
        debug!("Resolved profile for {}", profile.display_name);

        match self.identity.write() {
            Ok(mut guard) => *guard = Some(profile.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(profile.clone()),
        }
        state.profile = Some(profile);
        Ok(())
    }

    fn persist(&self, state: &SessionState) -> Result<(), AppError> {
        self.store.save(&state.to_stored())
    }

    fn current_token(&self, state: &SessionState) -> Result<String, AppError> {
        state
            .oauth2
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| AppError::MissingArtifact("OAuth2 token".to_string()))
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
