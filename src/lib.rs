//! garmin-session
//!
//! Durable Garmin Connect session: SSO login, OAuth1 → OAuth2 exchange,
//! on-disk token persistence and an authenticated request executor with
//! re-authentication and backoff.

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod fitness;
pub mod http;
pub mod retry;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use auth::{LoginCredentials, MfaPrompt, Session, SessionPhase, TokenStore, UserProfile};
pub use client::{GarminClient, RequestOptions};
pub use config::{ClientConfig, Endpoints};
pub use error::{AppError, ErrorKind};
pub use fitness::FitnessApi;
pub use retry::{RetryDecision, RetryPolicy};
