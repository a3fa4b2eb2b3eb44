//! Login / registration form state machine.

use std::error::Error;
use std::fmt;

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::models::{LoginRequest, RegisterRequest, TokenResponse};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn title(self) -> &'static str {
        match self {
            AuthMode::Login => "Sign in",
            AuthMode::Register => "Create account",
        }
    }

    /// Generic message shown when the server gives no detail.
    pub fn failure_message(self) -> &'static str {
        match self {
            AuthMode::Login => LOGIN_FAILED_MESSAGE,
            AuthMode::Register => REGISTER_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Idle,
    Submitting,
}

/// Local validation failures. No request is issued when one occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    InvalidEmail,
    MissingPassword,
    MissingFullName,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::InvalidEmail => f.write_str("Please enter a valid email address."),
            FormError::MissingPassword => f.write_str("Please enter your password."),
            FormError::MissingFullName => f.write_str("Please enter your full name."),
        }
    }
}

impl Error for FormError {}

/// Why `begin_submit` did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    AlreadySubmitting,
    Invalid(FormError),
}

/// A validated request ready to send.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    Login(LoginRequest),
    Register(RegisterRequest),
}

impl AuthRequest {
    pub fn mode(&self) -> AuthMode {
        match self {
            AuthRequest::Login(_) => AuthMode::Login,
            AuthRequest::Register(_) => AuthMode::Register,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            AuthRequest::Login(r) => &r.email,
            AuthRequest::Register(r) => &r.email,
        }
    }

    /// # Errors
    /// Returns the `ApiError` of the login or registration request.
    pub async fn send(&self, client: &ApiClient) -> ApiResult<TokenResponse> {
        match self {
            AuthRequest::Login(request) => client.login(request).await,
            AuthRequest::Register(request) => client.register(request).await,
        }
    }
}

/// Email must look like `local@domain` with a dot in the domain.
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Form contents plus mode and phase.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub phase: AuthPhase,
    pub email: String,
    pub password: String,
    /// Only sent in register mode.
    pub full_name: String,
    pub error: Option<String>,
}

impl AuthForm {
    pub fn is_submitting(&self) -> bool {
        self.phase == AuthPhase::Submitting
    }

    /// Switches login/register; email and password are kept.
    pub fn toggle_mode(&mut self) {
        if self.is_submitting() {
            return;
        }
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.error = None;
    }

    /// # Errors
    /// Returns the first `FormError` found, checked in field order.
    pub fn validate(&self) -> Result<(), FormError> {
        if !looks_like_email(self.email.trim()) {
            return Err(FormError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(FormError::MissingPassword);
        }
        if self.mode == AuthMode::Register && self.full_name.trim().is_empty() {
            return Err(FormError::MissingFullName);
        }
        Ok(())
    }

    /// Validates and enters `Submitting`, returning the request to send.
    ///
    /// # Errors
    /// Returns `SubmitRejected` when a request is already in flight or the
    /// form does not validate.
    pub fn begin_submit(&mut self) -> Result<AuthRequest, SubmitRejected> {
        if self.is_submitting() {
            return Err(SubmitRejected::AlreadySubmitting);
        }
        if let Err(err) = self.validate() {
            self.error = Some(err.to_string());
            return Err(SubmitRejected::Invalid(err));
        }

        let email = self.email.trim().to_string();
        let password = self.password.clone();
        let request = match self.mode {
            AuthMode::Login => AuthRequest::Login(LoginRequest { email, password }),
            AuthMode::Register => AuthRequest::Register(RegisterRequest {
                email,
                password,
                full_name: self.full_name.trim().to_string(),
            }),
        };

        self.phase = AuthPhase::Submitting;
        self.error = None;
        Ok(request)
    }

    /// Returns to `Idle`. Yields the token response on success.
    pub fn finish(&mut self, outcome: ApiResult<TokenResponse>) -> Option<TokenResponse> {
        self.phase = AuthPhase::Idle;
        match outcome {
            Ok(response) => {
                self.error = None;
                self.password.clear();
                Some(response)
            }
            Err(err) => {
                self.fail(&err);
                None
            }
        }
    }

    fn fail(&mut self, err: &ApiError) {
        tracing::warn!(mode = ?self.mode, error = %err, "authentication failed");
        self.error = Some(err.user_message(self.mode.failure_message()));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiSettings;
    use crate::models::User;

    fn filled(mode: AuthMode) -> AuthForm {
        AuthForm {
            mode,
            email: "ada@example.com".to_string(),
            password: "pw".to_string(),
            full_name: "Ada Lovelace".to_string(),
            ..AuthForm::default()
        }
    }

    fn token_response() -> TokenResponse {
        TokenResponse {
            access_token: "t".to_string(),
            token_type: "bearer".to_string(),
            user: User {
                id: "u1".to_string(),
                email: "ada@example.com".to_string(),
                full_name: "Ada Lovelace".to_string(),
            },
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@localhost"));
        assert!(!looks_like_email("a da@example.com"));
        assert!(!looks_like_email("ada@@example.com"));
    }

    #[test]
    fn test_toggle_keeps_credentials() {
        let mut form = filled(AuthMode::Login);
        form.error = Some("old".to_string());
        form.toggle_mode();
        assert_eq!(form.mode, AuthMode::Register);
        assert_eq!(form.email, "ada@example.com");
        assert_eq!(form.password, "pw");
        assert_eq!(form.error, None);
    }

    #[test]
    fn test_validation_blocks_submit() {
        let mut form = filled(AuthMode::Login);
        form.email = "nope".to_string();
        assert_eq!(
            form.begin_submit().unwrap_err(),
            SubmitRejected::Invalid(FormError::InvalidEmail)
        );
        assert_eq!(form.phase, AuthPhase::Idle);
        assert!(form.error.is_some());

        let mut form = filled(AuthMode::Register);
        form.full_name = "  ".to_string();
        assert_eq!(
            form.begin_submit().unwrap_err(),
            SubmitRejected::Invalid(FormError::MissingFullName)
        );
    }

    #[test]
    fn test_login_ignores_full_name() {
        let mut form = filled(AuthMode::Login);
        form.full_name.clear();
        let request = form.begin_submit().unwrap();
        assert!(matches!(request, AuthRequest::Login(_)));
        assert!(form.is_submitting());
    }

    #[test]
    fn test_submit_while_submitting_is_ignored() {
        let mut form = filled(AuthMode::Login);
        form.begin_submit().unwrap();
        assert_eq!(
            form.begin_submit().unwrap_err(),
            SubmitRejected::AlreadySubmitting
        );
        form.toggle_mode();
        assert_eq!(form.mode, AuthMode::Login);
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let mut form = filled(AuthMode::Register);
        form.begin_submit().unwrap();
        let failed = form.finish(Err(ApiError::from_status(
            400,
            r#"{"detail":"Email already registered"}"#,
        )));
        assert!(failed.is_none());
        assert_eq!(form.phase, AuthPhase::Idle);
        assert_eq!(form.error.as_deref(), Some("Email already registered"));

        form.begin_submit().unwrap();
        let ok = form.finish(Ok(token_response()));
        assert!(ok.is_some());
        assert_eq!(form.phase, AuthPhase::Idle);
        assert_eq!(form.error, None);
    }

    #[test]
    fn test_generic_failure_message() {
        let mut form = filled(AuthMode::Login);
        form.begin_submit().unwrap();
        form.finish(Err(ApiError::from_status(500, "")));
        assert_eq!(form.error.as_deref(), Some(LOGIN_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_register_request_hits_register_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "pw",
                "full_name": "Ada Lovelace"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "t",
                "token_type": "bearer",
                "user": {"id": "u1", "email": "ada@example.com", "full_name": "Ada Lovelace"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut form = filled(AuthMode::Register);
        let request = form.begin_submit().unwrap();
        let client = ApiClient::anonymous(&ApiSettings::new(server.uri())).unwrap();
        let response = form.finish(request.send(&client).await).unwrap();
        assert_eq!(response.access_token, "t");
    }
}
