//! Analysis screen: one text in, one classification out.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{Credential, SessionStore};
use crate::models::AnalysisResult;

use super::{Phase, Redirect, Route, DEFAULT_REDIRECT_DELAY};

const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to analyze";
const NOT_LOGGED_IN_MESSAGE: &str = "You must be logged in";

/// A request ready to go out. Only built while holding a credential, so a
/// `/predict` call can never be made without one.
#[derive(Debug, Clone)]
pub struct PendingAnalysis {
    pub text: String,
    pub credential: Credential,
}

impl PendingAnalysis {
    pub async fn send(self, api: &ApiClient) -> Result<AnalysisResult, ApiError> {
        api.analyze(&self.text, &self.credential).await
    }
}

pub struct AnalysisController {
    pub text: String,
    phase: Phase,
    result: Option<AnalysisResult>,
    error: Option<String>,
    credential: Option<Credential>,
    redirect_delay: Duration,
}

impl Default for AnalysisController {
    fn default() -> Self {
        Self::new(DEFAULT_REDIRECT_DELAY)
    }
}

impl AnalysisController {
    pub fn new(redirect_delay: Duration) -> Self {
        Self {
            text: String::new(),
            phase: Phase::Idle,
            result: None,
            error: None,
            credential: None,
            redirect_delay,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Pick up the stored credential. Without one the screen is not usable
    /// and the login route is returned.
    pub fn mount(&mut self, store: &SessionStore) -> Option<Route> {
        self.credential = store.read();
        if self.credential.is_none() {
            debug!("No credential on mount, redirecting to login");
            return Some(Route::Login);
        }
        None
    }

    /// Validate the text and enter `Loading`. Blank text and a missing
    /// credential are reported locally without any request.
    pub fn begin_analyze(&mut self) -> Option<PendingAnalysis> {
        if self.is_loading() {
            return None;
        }

        if self.text.trim().is_empty() {
            self.fail(ApiError::Validation(EMPTY_TEXT_MESSAGE.to_string()).to_string());
            return None;
        }

        let Some(credential) = self.credential.clone() else {
            self.fail(NOT_LOGGED_IN_MESSAGE.to_string());
            return None;
        };

        self.error = None;
        self.result = None;
        self.phase = Phase::Loading;
        Some(PendingAnalysis {
            text: self.text.clone(),
            credential,
        })
    }

    /// Apply the backend's answer. A rejected credential is dropped from the
    /// store and a delayed redirect to login is returned.
    pub fn complete(
        &mut self,
        outcome: Result<AnalysisResult, ApiError>,
        store: &SessionStore,
    ) -> Option<Redirect> {
        match outcome {
            Ok(result) => {
                debug!(score = result.score, sentiment = %result.sentiment, "Analysis complete");
                self.result = Some(result);
                self.error = None;
                self.phase = Phase::Success;
                None
            }
            Err(e) if e.is_session_expired() => {
                info!(error = %e, "Session expired, clearing credential");
                if let Err(e) = store.clear() {
                    warn!(error = %e, "Failed to clear credential");
                }
                self.credential = None;
                self.fail(format!("Session expired ({}). Please log in again.", e));
                Some(Redirect {
                    route: Route::Login,
                    after: self.redirect_delay,
                })
            }
            Err(e) => {
                warn!(error = %e, "Analysis failed");
                self.fail(e.to_string());
                None
            }
        }
    }

    /// Validate, send and apply in one go.
    pub async fn analyze(&mut self, api: &ApiClient, store: &SessionStore) -> Option<Redirect> {
        let pending = self.begin_analyze()?;
        let outcome = pending.send(api).await;
        self.complete(outcome, store)
    }

    /// Back to an empty form. Ignored while a request is in flight.
    pub fn reset(&mut self) {
        if self.is_loading() {
            return;
        }
        self.text.clear();
        self.result = None;
        self.error = None;
        self.phase = Phase::Idle;
    }

    /// Forget the credential everywhere and head to login.
    pub fn logout(&mut self, store: &SessionStore) -> Route {
        if let Err(e) = store.clear() {
            warn!(error = %e, "Failed to clear credential");
        }
        self.credential = None;
        info!("Logged out");
        Route::Login
    }

    fn fail(&mut self, message: String) {
        self.phase = Phase::Error;
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn logged_in_store(token: &str) -> SessionStore {
        let store = SessionStore::in_memory();
        store.save(&Credential::new(token).unwrap()).unwrap();
        store
    }

    fn mounted(store: &SessionStore) -> AnalysisController {
        let mut controller = AnalysisController::default();
        assert_eq!(controller.mount(store), None);
        controller
    }

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            text: "ok".to_string(),
            score: 4,
            sentiment: "positif".to_string(),
            user: "admin".to_string(),
        }
    }

    /// Backend that fails the test if `/predict` is called at all
    async fn silent_backend() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_mount_without_credential_redirects() {
        let store = SessionStore::in_memory();
        let mut controller = AnalysisController::default();
        assert_eq!(controller.mount(&store), Some(Route::Login));
        assert!(!controller.has_credential());
    }

    #[test]
    fn test_blank_text_is_local_error() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);

        for text in ["", "   ", "\n\t "] {
            controller.text = text.to_string();
            assert!(controller.begin_analyze().is_none());
            assert_eq!(controller.phase(), Phase::Error);
            assert_eq!(controller.error(), Some(EMPTY_TEXT_MESSAGE));
        }
    }

    #[test]
    fn test_missing_credential_never_yields_request() {
        let mut controller = AnalysisController::default();
        controller.text = "hello".to_string();
        assert!(controller.begin_analyze().is_none());
        assert_eq!(controller.error(), Some(NOT_LOGGED_IN_MESSAGE));
    }

    #[test]
    fn test_begin_carries_credential_and_blocks_resubmit() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "hello".to_string();

        let pending = controller.begin_analyze().unwrap();
        assert_eq!(pending.text, "hello");
        assert_eq!(pending.credential.as_str(), "abc");
        assert!(controller.is_loading());
        assert!(controller.begin_analyze().is_none());
    }

    #[test]
    fn test_complete_success_keeps_result_verbatim() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();
        controller.begin_analyze().unwrap();

        assert_eq!(controller.complete(Ok(sample_result()), &store), None);
        assert_eq!(controller.phase(), Phase::Success);
        assert_eq!(controller.result(), Some(&sample_result()));
        assert_eq!(controller.error(), None);
    }

    #[test]
    fn test_new_submit_clears_previous_result() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();
        controller.begin_analyze().unwrap();
        controller.complete(Ok(sample_result()), &store);

        controller.begin_analyze().unwrap();
        assert!(controller.result().is_none());
    }

    #[test]
    fn test_complete_session_expired() {
        let store = logged_in_store("stale");
        let mut controller = AnalysisController::new(Duration::from_millis(250));
        controller.mount(&store);
        controller.text = "ok".to_string();
        controller.begin_analyze().unwrap();

        let err = ApiError::from_analysis_failure(StatusCode::UNAUTHORIZED, r#"{"detail":"Token invalide"}"#);
        let redirect = controller.complete(Err(err), &store);

        assert_eq!(
            redirect,
            Some(Redirect {
                route: Route::Login,
                after: Duration::from_millis(250),
            })
        );
        assert!(controller.error().unwrap().contains("Token invalide"));
        assert!(!store.is_authenticated());
        assert!(!controller.has_credential());

        // No credential left, so no further requests
        assert!(controller.begin_analyze().is_none());
    }

    #[test]
    fn test_complete_other_error() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();
        controller.begin_analyze().unwrap();

        let redirect = controller.complete(Err(ApiError::Transport), &store);
        assert_eq!(redirect, None);
        assert_eq!(controller.error(), Some(crate::api::TRANSPORT_ERROR_MESSAGE));
        assert_eq!(controller.phase(), Phase::Error);
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_reset() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();
        controller.begin_analyze().unwrap();
        controller.complete(Ok(sample_result()), &store);

        controller.reset();
        assert!(controller.text.is_empty());
        assert!(controller.result().is_none());
        assert!(controller.error().is_none());
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.has_credential());
    }

    #[test]
    fn test_reset_ignored_while_loading() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();
        controller.begin_analyze().unwrap();
        controller.reset();
        assert!(controller.is_loading());
        assert_eq!(controller.text, "ok");
    }

    #[test]
    fn test_logout() {
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        assert_eq!(controller.logout(&store), Route::Login);
        assert!(!store.is_authenticated());
        assert!(!controller.has_credential());
    }

    #[tokio::test]
    async fn test_analyze_against_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "ok",
                "score": 4,
                "sentiment": "positif",
                "user": "admin"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();

        assert_eq!(controller.analyze(&api, &store).await, None);
        assert_eq!(controller.result(), Some(&sample_result()));
    }

    #[tokio::test]
    async fn test_analyze_expired_token_against_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token invalide"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri()).unwrap();
        let store = logged_in_store("stale");
        let mut controller = mounted(&store);
        controller.text = "ok".to_string();

        let redirect = controller.analyze(&api, &store).await.unwrap();
        assert_eq!(redirect.route, Route::Login);
        assert_eq!(redirect.after, DEFAULT_REDIRECT_DELAY);
        assert!(controller.error().unwrap().contains("Token invalide"));
        assert!(store.read().is_none());
    }

    #[tokio::test]
    async fn test_blank_text_sends_nothing() {
        let server = silent_backend().await;
        let api = ApiClient::new(&server.uri()).unwrap();
        let store = logged_in_store("abc");
        let mut controller = mounted(&store);
        controller.text = "   ".to_string();

        assert_eq!(controller.analyze(&api, &store).await, None);
        assert_eq!(controller.error(), Some(EMPTY_TEXT_MESSAGE));
    }

    #[tokio::test]
    async fn test_logged_out_sends_nothing() {
        let server = silent_backend().await;
        let api = ApiClient::new(&server.uri()).unwrap();
        let store = SessionStore::in_memory();
        let mut controller = AnalysisController::default();
        assert_eq!(controller.mount(&store), Some(Route::Login));
        controller.text = "hello".to_string();

        assert_eq!(controller.analyze(&api, &store).await, None);
        assert_eq!(controller.error(), Some(NOT_LOGGED_IN_MESSAGE));
    }
}
