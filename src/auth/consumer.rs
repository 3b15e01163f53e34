//! Consumer key/secret lookup, fetched once per process

use crate::auth::ConsumerCredentials;
use crate::error::AppError;
use crate::http::success_text;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct ConsumerRegistry {
    url: String,
    cached: OnceCell<ConsumerCredentials>,
}

impl ConsumerRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cached: OnceCell::new(),
        }
    }

    /// Memoized after the first success; failures are not cached
    pub async fn get(&self, client: &reqwest::Client) -> Result<ConsumerCredentials, AppError> {
        self.cached
            .get_or_try_init(|| self.fetch(client))
            .await
            .cloned()
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<ConsumerCredentials, AppError> {
        debug!("Fetching OAuth consumer from {}", self.url);
        let response = client.get(&self.url).send().await?;
        let body = success_text(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::Parse(format!("Invalid OAuth consumer document: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_consumer_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth_consumer.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "consumer_key": "key",
                "consumer_secret": "secret"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = ConsumerRegistry::new(format!("{}/oauth_consumer.json", server.uri()));
        let client = reqwest::Client::new();

        let first = registry.get(&client).await.unwrap();
        let second = registry.get(&client).await.unwrap();
        assert_eq!(first.consumer_key, "key");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_consumer_http_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth_consumer.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .expect(2)
            .mount(&server)
            .await;

        let registry = ConsumerRegistry::new(format!("{}/oauth_consumer.json", server.uri()));
        let client = reqwest::Client::new();

        let err = registry.get(&client).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        // Not cached: the next call goes back to the network
        assert!(registry.get(&client).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_consumer_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth_consumer.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "only"})))
            .mount(&server)
            .await;

        let registry = ConsumerRegistry::new(format!("{}/oauth_consumer.json", server.uri()));
        let err = registry.get(&reqwest::Client::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
