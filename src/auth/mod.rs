pub mod consumer;
pub mod exchange;
pub mod oauth1;
pub mod scrape;
pub mod session;
pub mod sso;
pub mod storage;
pub mod types;


pub use scrape::{ArtifactExtractor, RegexExtractor};
pub use session::{Session, SessionPhase, SessionSnapshot};
pub use sso::SsoFlow;
pub use storage::{StoredTokens, TokenStore};
pub use types::{
    ConsumerCredentials, LoginCredentials, MfaPrompt, OAuth1Token, OAuth2Token, UserProfile,
};
