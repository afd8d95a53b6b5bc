use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::error::MailcowError;
use crate::gateway::Gateway;
use crate::resource::{Operation, ResourceKind};
use crate::response::ApiResponse;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_ERROR_BODY: usize = 200;

pub struct MailcowClient {
    client: Client,
    base_url: String,
}

impl MailcowClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, MailcowError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| MailcowError::Config("API key contains invalid characters".into()))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("mailcow-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{endpoint}", self.base_url)
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, MailcowError> {
        let url = self.url(endpoint);
        debug!(%method, %url, "mailcow request");

        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(MailcowError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| MailcowError::InvalidResponse(format!("{e}: {}", truncate(&text, MAX_ERROR_BODY))))
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl Gateway for MailcowClient {
    async fn execute(
        &self,
        operation: Operation,
        kind: ResourceKind,
        payload: Value,
    ) -> Result<ApiResponse, MailcowError> {
        let endpoint = kind
            .endpoint(operation)
            .ok_or_else(|| MailcowError::Other(format!("{operation:?} is not supported for {kind}")))?;
        let value = if operation.is_read() {
            self.request(Method::GET, endpoint, None).await?
        } else {
            self.request(Method::POST, endpoint, Some(&payload)).await?
        };
        Ok(ApiResponse::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = MailcowClient::new("https://mail.example.com/", "key").unwrap();
        assert_eq!(
            client.url("get/mailbox/all"),
            "https://mail.example.com/api/v1/get/mailbox/all"
        );
    }

    #[test]
    fn invalid_api_key_is_a_config_error() {
        let err = MailcowClient::new("https://mail.example.com", "bad\nkey").err();
        assert!(matches!(err, Some(MailcowError::Config(_))));
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
