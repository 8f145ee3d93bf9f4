//! API client for the sentiment analysis backend.
//!
//! This module provides the `ApiClient` struct for exchanging credentials
//! and classifying text.

use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::Credential;
use crate::models::{AnalysisRequest, AnalysisResult, LoginRequest, LoginResult};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// HTTP request timeout in seconds.
/// Model inference on a cold backend can take a while.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/login";
const PREDICT_PATH: &str = "/predict";

/// API client for the sentiment backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange a username and password for a bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, username = username, "Sending login request");

        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let (status, text) = Self::read_body(response).await?;

        if !status.is_success() {
            let err = ApiError::from_login_failure(status, &text);
            warn!(status = status.as_u16(), error = %err, "Login rejected");
            return Err(err);
        }

        Self::parse(&text, "login")
    }

    /// Classify a text. The credential is sent as a bearer token.
    pub async fn analyze(&self, text: &str, credential: &Credential) -> Result<AnalysisResult, ApiError> {
        let url = self.url(PREDICT_PATH);
        debug!(url = %url, chars = text.chars().count(), "Sending predict request");

        let body = AnalysisRequest {
            text: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.as_str())
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let (status, text) = Self::read_body(response).await?;

        if !status.is_success() {
            let err = ApiError::from_analysis_failure(status, &text);
            warn!(status = status.as_u16(), error = %err, "Predict rejected");
            return Err(err);
        }

        Self::parse(&text, "predict")
    }

    async fn read_body(response: Response) -> Result<(StatusCode, String), ApiError> {
        let status = response.status();
        let text = response.text().await.map_err(Self::transport_error)?;
        Ok((status, text))
    }

    fn parse<T: DeserializeOwned>(text: &str, endpoint: &str) -> Result<T, ApiError> {
        serde_json::from_str(text).map_err(|e| {
            warn!(endpoint = endpoint, error = %e, "Unexpected response body");
            ApiError::InvalidResponse(format!("{} response: {}", endpoint, e))
        })
    }

    /// The raw error is only logged; callers get the fixed advisory.
    fn transport_error(e: reqwest::Error) -> ApiError {
        warn!(error = %e, timeout = e.is_timeout(), "No response from backend");
        ApiError::Transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential(token: &str) -> Credential {
        Credential::new(token).unwrap()
    }

    /// An address nothing listens on
    async fn dead_url() -> String {
        // wiremock pools servers, so a dropped MockServer keeps listening;
        // bind and release an ephemeral port instead.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(LOGIN_PATH), "http://localhost:8000/login");
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({"username": "admin", "password": "admin123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "bearer",
                "username": "admin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let result = client.login("admin", "admin123").await.unwrap();
        assert_eq!(result.access_token, "abc");
        assert_eq!(result.token_type, "bearer");
        assert_eq!(result.username, "admin");
    }

    #[tokio::test]
    async fn test_login_rejected_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Identifiants incorrects"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.login("admin", "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::Credential { status, .. } if status == StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "Identifiants incorrects");
    }

    #[tokio::test]
    async fn test_login_rejected_without_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.login("admin", "admin123").await.unwrap_err();
        assert_eq!(err.to_string(), "Login failed");
    }

    #[tokio::test]
    async fn test_login_unreachable() {
        let client = ApiClient::new(&dead_url().await).unwrap();
        let err = client.login("admin", "admin123").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport));
    }

    #[tokio::test]
    async fn test_analyze_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(json!({"text": "ok"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "ok",
                "score": 4,
                "sentiment": "positif",
                "user": "admin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let result = client.analyze("ok", &credential("abc")).await.unwrap();
        assert_eq!(
            result,
            AnalysisResult {
                text: "ok".to_string(),
                score: 4,
                sentiment: "positif".to_string(),
                user: "admin".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_analyze_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token invalide"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.analyze("ok", &credential("stale")).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "Token invalide");
        assert!(err.is_session_expired());
    }

    #[tokio::test]
    async fn test_analyze_error_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Texte trop long"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.analyze("ok", &credential("abc")).await.unwrap_err();
        assert_eq!(err.to_string(), "Texte trop long");
        assert!(!err.is_session_expired());
    }

    #[tokio::test]
    async fn test_analyze_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.analyze("ok", &credential("abc")).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[tokio::test]
    async fn test_analyze_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sentiment": "positif"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client.analyze("ok", &credential("abc")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_analyze_unreachable() {
        let client = ApiClient::new(&dead_url().await).unwrap();
        let err = client.analyze("ok", &credential("abc")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport));
        assert_eq!(err.to_string(), crate::api::TRANSPORT_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_analyze_timeout_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = ApiClient::with_timeout(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.analyze("ok", &credential("abc")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport));
    }
}
