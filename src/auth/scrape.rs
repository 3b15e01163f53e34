//! Extraction of login artifacts from SSO HTML pages
//!
//! The SSO pages are undocumented and change without notice, so everything
//! that knows about their markup lives behind [`ArtifactExtractor`].

use crate::error::AppError;
use regex::Regex;

pub trait ArtifactExtractor: Send + Sync {
    /// Hidden `_csrf` form value on a sign-in (or MFA) page
    fn csrf_token(&self, html: &str) -> Option<String>;

    /// Service ticket embedded in the page shown after a successful login
    fn ticket(&self, html: &str) -> Option<String>;

    /// Whether the page asks for a second-factor code
    fn is_mfa_challenge(&self, html: &str) -> bool;
}

/// Pattern-based extractor matching the current SSO markup
pub struct RegexExtractor {
    csrf: Regex,
    ticket: Regex,
    mfa_title: Regex,
    mfa_field: Regex,
}

impl RegexExtractor {
    pub fn new() -> Result<Self, AppError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| AppError::Config(format!("Invalid pattern {}: {}", pattern, e)))
        };
        Ok(Self {
            csrf: compile(r#"name="_csrf"\s+value="(.+?)""#)?,
            ticket: compile(r#"ticket=([^"]+)""#)?,
            mfa_title: compile(r"(?i)<title>[^<]*\bMFA\b[^<]*</title>")?,
            mfa_field: compile(r#"name="mfa-code""#)?,
        })
    }
}

impl ArtifactExtractor for RegexExtractor {
    fn csrf_token(&self, html: &str) -> Option<String> {
        first_capture(&self.csrf, html)
    }

    fn ticket(&self, html: &str) -> Option<String> {
        first_capture(&self.ticket, html)
    }

    fn is_mfa_challenge(&self, html: &str) -> bool {
        self.mfa_title.is_match(html) || self.mfa_field.is_match(html)
    }
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
