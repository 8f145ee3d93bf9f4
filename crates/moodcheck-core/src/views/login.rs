use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{Credential, SessionStore};
use crate::models::{LoginRequest, LoginResult};

use super::{Phase, Route};

const MISSING_FIELDS_MESSAGE: &str = "Username and password required";

/// Login form state.
#[derive(Default)]
pub struct LoginController {
    pub username: String,
    pub password: String,
    phase: Phase,
    error: Option<String>,
    signed_in_as: Option<String>,
}

impl LoginController {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Username the backend confirmed on the last successful login
    pub fn signed_in_as(&self) -> Option<&str> {
        self.signed_in_as.as_deref()
    }

    /// Validate the form and enter `Loading`. Returns `None` while a request
    /// is already in flight or when a field is empty.
    pub fn submit(&mut self) -> Option<LoginRequest> {
        if self.is_loading() {
            return None;
        }

        if self.username.trim().is_empty() || self.password.is_empty() {
            self.fail(ApiError::Validation(MISSING_FIELDS_MESSAGE.to_string()).to_string());
            return None;
        }

        self.phase = Phase::Loading;
        self.error = None;
        Some(LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }

    /// Apply the backend's answer. On success the token is persisted and the
    /// analysis screen is returned as the next route.
    pub fn complete(&mut self, outcome: Result<LoginResult, ApiError>, store: &SessionStore) -> Option<Route> {
        self.password.clear();

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Login failed");
                self.fail(e.to_string());
                return None;
            }
        };

        let Some(credential) = Credential::new(result.access_token) else {
            warn!("Login response carried an empty access token");
            self.fail(ApiError::InvalidResponse("empty access token".to_string()).to_string());
            return None;
        };

        if let Err(e) = store.save(&credential) {
            error!(error = %e, "Failed to save session");
            self.fail(format!("Could not save session: {}", e));
            return None;
        }

        info!(username = %result.username, "Login successful");
        self.signed_in_as = Some(result.username);
        self.phase = Phase::Success;
        self.error = None;
        Some(Route::Analysis)
    }

    /// Submit and wait for the answer in one go.
    pub async fn run(&mut self, api: &ApiClient, store: &SessionStore) -> Option<Route> {
        let request = self.submit()?;
        let outcome = api.login(&request.username, &request.password).await;
        self.complete(outcome, store)
    }

    fn fail(&mut self, message: String) {
        self.phase = Phase::Error;
        self.error = Some(message);
    }
}
