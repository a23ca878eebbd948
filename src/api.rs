//! HTTP helpers for the portal's JSON API with a single timeout policy and
//! consistent error mapping. Callers pass the bearer token explicitly; the
//! helpers never store it and never log it.

use crate::{config::AuthConfig, APP_USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status of a rejected request, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// # Errors
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self, ApiError> {
        // the verifier keeps the ceremony challenge in a cookie between options and verification
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    /// Posts JSON and parses a JSON response.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status, or an undecodable body.
    #[instrument(skip(self, body, bearer))]
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = with_bearer(self.client.post(self.url(path)).json(body), bearer);
        let response = send(request).await?;

        handle_json_response(response).await
    }

    /// Posts an empty body and discards the response body.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip(self, bearer))]
    pub async fn post_empty(&self, path: &str, bearer: Option<&SecretString>) -> Result<(), ApiError> {
        let request = with_bearer(self.client.post(self.url(path)), bearer);
        let response = send(request).await?;

        handle_empty_response(response).await
    }

    /// Fetches JSON.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status, or an undecodable body.
    #[instrument(skip(self, bearer))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let request = with_bearer(self.client.get(self.url(path)), bearer);
        let response = send(request).await?;

        handle_json_response(response).await
    }
}

fn with_bearer(request: RequestBuilder, bearer: Option<&SecretString>) -> RequestBuilder {
    match bearer {
        Some(token) => request.bearer_auth(token.expose_secret()),
        None => request,
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    request.send().await.map_err(map_request_error)
}

/// Builds a URL from an explicit base URL and the provided path.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    debug!(status = status.as_u16(), "response received");

    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

async fn handle_empty_response(response: Response) -> Result<(), ApiError> {
    let status = response.status();
    debug!(status = status.as_u16(), "response received");

    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Trims and truncates an error body for user-facing messages. JSON bodies with a
/// `message` or `error` field are reduced to that field.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Request failed.".to_string();
    }

    let extracted = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });

    extracted
        .as_deref()
        .unwrap_or(trimmed)
        .chars()
        .take(MAX_ERROR_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn build_url_joins_slashes() {
        assert_eq!(
            build_url_with_base("http://h/api/v1/", "/auth/logout"),
            "http://h/api/v1/auth/logout"
        );
        assert_eq!(
            build_url_with_base("http://h", "auth/logout"),
            "http://h/auth/logout"
        );
        assert_eq!(build_url_with_base("  ", "/auth"), "/auth");
    }

    #[test]
    fn sanitize_body_prefers_message_field() {
        assert_eq!(sanitize_body(""), "Request failed.");
        assert_eq!(sanitize_body(r#"{"message":"Failed"}"#), "Failed");
        assert_eq!(
            sanitize_body(r#"{"error":"Something went wrong"}"#),
            "Something went wrong"
        );
        assert_eq!(sanitize_body("  plain text  "), "plain text");
        assert_eq!(sanitize_body(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }

    #[tokio::test]
    async fn post_json_sends_bearer_and_parses_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/ping"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let config = AuthConfig::new(&format!("{}/api/v1", server.uri())).unwrap();
        let client = HttpClient::new(&config).unwrap();
        let token = SecretString::from("abc".to_string());

        let body: Value = client
            .post_json("/ping", &json!({}), Some(&token))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn error_status_is_reported_with_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/assets"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "nope"})))
            .mount(&server)
            .await;

        let config = AuthConfig::new(&server.uri()).unwrap();
        let client = HttpClient::new(&config).unwrap();

        let err = client.get_json::<Value>("/assets", None).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "Request failed (403): nope");
    }
}
