//! OAuth 1.0a request signing (HMAC-SHA1)

use crate::auth::{ConsumerCredentials, OAuth1Token};
use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Signs requests with the consumer credentials and, once available, an
/// OAuth1 token
pub struct OAuth1Signer<'a> {
    consumer: &'a ConsumerCredentials,
    token: Option<&'a OAuth1Token>,
}

impl<'a> OAuth1Signer<'a> {
    pub fn new(consumer: &'a ConsumerCredentials, token: Option<&'a OAuth1Token>) -> Self {
        Self { consumer, token }
    }

    /// `oauth_*` parameters, including `oauth_signature`, for a request to `url`.
    /// Query parameters already on `url` are covered by the signature.
    pub fn authorize(&self, method: &str, url: &Url) -> Result<Vec<(String, String)>, AppError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorize_with(method, url, &[], &nonce, &timestamp)
    }

    /// Value for an `Authorization` header
    pub fn authorization_header(&self, method: &str, url: &Url) -> Result<String, AppError> {
        Ok(header_value(&self.authorize(method, url)?))
    }

    fn authorize_with(
        &self,
        method: &str,
        url: &Url,
        extra_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<Vec<(String, String)>, AppError> {
        let mut oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.consumer.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
        ];
        if let Some(token) = self.token {
            oauth_params.push(("oauth_token".to_string(), token.oauth_token.clone()));
        }
        oauth_params.push(("oauth_version".to_string(), OAUTH_VERSION.to_string()));

        let mut signed: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        signed.extend(extra_params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        signed.extend(oauth_params.iter().cloned());

        let base = signature_base_string(method, url, &signed);
        let signature = self.sign(&base)?;

        oauth_params.push(("oauth_signature".to_string(), signature));
        Ok(oauth_params)
    }

    fn sign(&self, base_string: &str) -> Result<String, AppError> {
        let token_secret = self
            .token
            .map(|t| t.oauth_token_secret.as_str())
            .unwrap_or("");
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer.consumer_secret),
            percent_encode(token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| AppError::Config(format!("HMAC init failed: {}", e)))?;
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `OAuth k="v", ...` with keys sorted and values percent-encoded
pub fn header_value(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    let fields = sorted
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&base_url(url)),
        percent_encode(&normalized)
    )
}

/// Scheme, host, non-default port and path; no query or fragment
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}

/// RFC 3986 unreserved characters pass through, everything else is %XX
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
