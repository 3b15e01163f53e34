//! SSO ticket acquisition
//!
//! Drives the hosted login widget the same way a desktop browser does:
//! seed cookies from the embed page, pick up the CSRF token from the sign-in
//! form, post the credentials and read the service ticket from the result.

use crate::auth::scrape::ArtifactExtractor;
use crate::auth::{LoginCredentials, MfaPrompt};
use crate::config::{Endpoints, SSO_CLIENT_ID, SSO_LOCALE, SSO_WIDGET_ID};
use crate::error::AppError;
use crate::http::{sso_client, success_text};
use reqwest::header::{ORIGIN, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

pub struct SsoFlow {
    endpoints: Endpoints,
    timeout: Duration,
    extractor: Box<dyn ArtifactExtractor>,
}

impl SsoFlow {
    pub fn new(endpoints: Endpoints, timeout: Duration, extractor: Box<dyn ArtifactExtractor>) -> Self {
        Self {
            endpoints,
            timeout,
            extractor,
        }
    }

    /// Log in through the SSO pages and return the service ticket
    pub async fn login_ticket(
        &self,
        credentials: &LoginCredentials,
        mfa_prompt: Option<&MfaPrompt>,
    ) -> Result<String, AppError> {
        // Fresh cookie jar per attempt
        let client = sso_client(self.timeout)?;

        self.seed_cookies(&client).await?;
        let csrf = self.signin_csrf(&client).await?;

        let page = self.submit(&client, credentials, &csrf, None).await?;
        if let Some(ticket) = self.extractor.ticket(&page) {
            return Ok(ticket);
        }

        if !self.extractor.is_mfa_challenge(&page) {
            return Err(AppError::LoginFailed(
                "invalid credentials or MFA required".to_string(),
            ));
        }

        let prompt = mfa_prompt.ok_or(AppError::MfaRequired)?;
        info!("SSO requested a second-factor code");
        let code = (**prompt)().await?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::InvalidInput("MFA code cannot be empty".to_string()));
        }

        let csrf = self.extractor.csrf_token(&page).unwrap_or(csrf);
        let page = self.submit(&client, credentials, &csrf, Some(code)).await?;
        self.extractor
            .ticket(&page)
            .ok_or_else(|| AppError::LoginFailed("MFA code was not accepted".to_string()))
    }

    async fn seed_cookies(&self, client: &Client) -> Result<(), AppError> {
        let embed = self.endpoints.sso_embed();
        debug!("Seeding SSO session cookies");
        let response = client
            .get(&embed)
            .query(&[
                ("clientId", SSO_CLIENT_ID),
                ("locale", SSO_LOCALE),
                ("service", embed.as_str()),
            ])
            .send()
            .await?;
        success_text(response).await?;
        Ok(())
    }

    async fn signin_csrf(&self, client: &Client) -> Result<String, AppError> {
        debug!("Loading SSO sign-in form");
        let response = client
            .get(self.endpoints.sso_signin())
            .query(&self.signin_params())
            .send()
            .await?;
        let page = success_text(response).await?;
        self.extractor
            .csrf_token(&page)
            .ok_or(AppError::CsrfExtraction)
    }

    async fn submit(
        &self,
        client: &Client,
        credentials: &LoginCredentials,
        csrf: &str,
        mfa_code: Option<&str>,
    ) -> Result<String, AppError> {
        let embed = self.endpoints.sso_embed();
        let signin = self.endpoints.sso_signin();

        let mut query = self.signin_params();
        query.extend([
            ("clientId", SSO_CLIENT_ID.to_string()),
            ("service", embed.clone()),
            ("source", embed.clone()),
            ("redirectAfterAccountLoginUrl", embed.clone()),
            ("redirectAfterAccountCreationUrl", embed),
        ]);

        let mut form = vec![
            ("username", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
            ("embed", "true"),
            ("_csrf", csrf),
        ];
        if let Some(code) = mfa_code {
            form.push(("mfa-code", code));
        }

        debug!("Submitting SSO sign-in form");
        let response = client
            .post(&signin)
            .query(&query)
            .form(&form)
            .header(ORIGIN, self.endpoints.sso_origin())
            .header(REFERER, signin.as_str())
            .header("DNT", "1")
            .send()
            .await?;
        success_text(response).await
    }

    fn signin_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", SSO_WIDGET_ID.to_string()),
            ("embedWidget", "true".to_string()),
            ("locale", SSO_LOCALE.to_string()),
            ("gauthHost", self.endpoints.sso_embed()),
        ]
    }
}
