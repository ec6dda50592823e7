//! Dashboard Session Authentication
//!
//! Stateless signed-cookie sessions against a single set of static credentials.
//!
//! # Security Model
//!
//! - **Credentials**: one configured username/password pair, compared in constant time
//! - **Session cookie**: `dkron_ui_session`, httpOnly, path `/`, HMAC-SHA256 signed
//! - **Statelessness**: no session table; every agent sharing the secret accepts
//!   every cookie signed with it
//! - **No revocation**: logout only asks the browser to drop the cookie. A cookie
//!   captured before logout stays valid until its own expiry. Rotating the
//!   secret is the only way to invalidate outstanding sessions.
//!
//! # Endpoints
//!
//! - `GET /login` - Minimal login page (auth + session enabled only)
//! - `POST /ui/login` - Authenticate with username/password, sets the cookie
//! - `POST /ui/logout` - Clear the cookie

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::dashboard::config::UiAuthConfig;
use crate::dashboard::session::{check_cookie, SessionSigner, SessionToken, SESSION_COOKIE};
use crate::dashboard::templates::{challenge_page, LOGIN_PAGE};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Session login is disabled")]
    FeatureDisabled,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Carries the rejected request URI so the challenge page can return to it
    #[error("Invalid or expired session")]
    InvalidOrExpiredSession { target: String },
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "Malformed request"),
            AuthError::FeatureDisabled => (StatusCode::NOT_FOUND, "Not found"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::InvalidOrExpiredSession { target } => {
                return (StatusCode::UNAUTHORIZED, Html(challenge_page(target))).into_response();
            }
        };

        let body = Json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.to_string(),
        });

        (status, body).into_response()
    }
}

/// Error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Body of successful login/logout responses
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authentication state, immutable after construction
pub struct AuthState {
    pub config: UiAuthConfig,
    signer: SessionSigner,
}

impl AuthState {
    pub fn new(config: UiAuthConfig) -> Self {
        let signer = SessionSigner::new(config.session_secret.as_bytes());
        Self { config, signer }
    }

    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    /// Compare both fields without revealing which one differed
    fn credentials_match(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.config.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.config.password.as_bytes());
        user_ok & pass_ok
    }

    /// Check a login attempt and mint a session expiring `effective_ttl` after `now`
    pub fn login(&self, req: &LoginRequest, now: i64) -> Result<SessionToken, AuthError> {
        if !self.config.gate_enabled() {
            return Err(AuthError::FeatureDisabled);
        }

        if !self.credentials_match(&req.username, &req.password) {
            return Err(AuthError::InvalidCredentials);
        }

        let expiry = now + self.config.effective_ttl_secs();
        Ok(SessionToken::issue(&self.signer, &req.username, expiry))
    }

    /// Build the session cookie for a freshly issued token
    pub fn session_cookie(&self, token: &SessionToken) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_cookie_value()))
            .path("/")
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(self.config.effective_ttl_secs()))
            .build()
    }

    /// Build the cookie that makes the browser drop the session immediately
    pub fn cleared_session_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }
}

/// `Set-Cookie` header carrying the cookie verbatim.
///
/// The value is written unencoded so the wire form stays
/// `<username>:<expiry>:<base64>` for every agent sharing the secret.
fn set_cookie_header(cookie: &Cookie<'_>) -> [(HeaderName, String); 1] {
    [(header::SET_COOKIE, cookie.to_string())]
}

/// First `dkron_ui_session` value in the raw `Cookie` headers, undecoded
fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ============================================================================
// Handlers
// ============================================================================

/// Login handler
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    body: Bytes,
) -> Result<([(HeaderName, String); 1], Json<OkResponse>), AuthError> {
    let login_req: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Rejecting malformed login body");
        AuthError::MalformedRequest(e.to_string())
    })?;

    let token = state.login(&login_req, Utc::now().timestamp()).map_err(|e| {
        warn!(error = %e, "UI login failed");
        e
    })?;

    info!(user = %token.username, expiry = token.expiry, "UI session issued");

    Ok((
        set_cookie_header(&state.session_cookie(&token)),
        Json(OkResponse { ok: true }),
    ))
}

/// Logout handler. Always succeeds, with or without a session.
pub async fn logout_handler() -> ([(HeaderName, String); 1], Json<OkResponse>) {
    debug!("Clearing UI session cookie");
    (
        set_cookie_header(&AuthState::cleared_session_cookie()),
        Json(OkResponse { ok: true }),
    )
}

/// Minimal login page
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

// ============================================================================
// Middleware
// ============================================================================

/// Session gate for protected UI routes
pub async fn session_gate(
    State(state): State<Arc<AuthState>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let value = session_cookie_value(req.headers());

    match check_cookie(&state.signer, value.as_deref(), Utc::now().timestamp()) {
        Ok(token) => {
            trace!(user = %token.username, "UI session accepted");
            Ok(next.run(req).await)
        }
        Err(reason) => {
            debug!(%reason, path = %req.uri().path(), "UI session rejected");
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());
            Err(AuthError::InvalidOrExpiredSession { target })
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the session router.
///
/// Login and logout are always routed so a disabled session feature answers
/// 404 from the handler rather than 405 from the `GET` fallback the server
/// registers on the same paths. The login page only exists when the gate is
/// active.
pub fn auth_router(state: Arc<AuthState>) -> Router {
    let mut router = Router::new()
        .route("/ui/login", post(login_handler))
        .route("/ui/logout", post(logout_handler));

    if state.config.gate_enabled() {
        router = router.route("/login", get(login_page));
    }

    router.with_state(state)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> UiAuthConfig {
        UiAuthConfig {
            enabled: true,
            session_enabled: true,
            username: "admin".to_string(),
            password: "secret".to_string(),
            session_secret: "test-secret-at-least-32-characters-long".to_string(),
            session_ttl_secs: 0,
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_login_issues_default_ttl() {
        let state = AuthState::new(test_config());
        let token = state.login(&login_req("admin", "secret"), 1_000).unwrap();

        assert_eq!(token.username, "admin");
        assert_eq!(token.expiry, 1_000 + 3600);
        assert!(token.validate(state.signer(), 1_000).is_ok());
    }

    #[test]
    fn test_login_uses_configured_ttl() {
        let state = AuthState::new(UiAuthConfig {
            session_ttl_secs: 120,
            ..test_config()
        });
        let token = state.login(&login_req("admin", "secret"), 1_000).unwrap();
        assert_eq!(token.expiry, 1_120);
    }

    #[test]
    fn test_login_wrong_password() {
        let state = AuthState::new(test_config());
        let result = state.login(&login_req("admin", "wrong"), 1_000);
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_login_wrong_username() {
        let state = AuthState::new(test_config());
        let result = state.login(&login_req("root", "secret"), 1_000);
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_login_disabled_even_with_valid_credentials() {
        let state = AuthState::new(UiAuthConfig {
            session_enabled: false,
            ..test_config()
        });
        let result = state.login(&login_req("admin", "secret"), 1_000);
        assert!(matches!(result, Err(AuthError::FeatureDisabled)));
    }

    #[test]
    fn test_login_disabled_when_auth_is_off() {
        let state = AuthState::new(UiAuthConfig {
            enabled: false,
            ..test_config()
        });
        let result = state.login(&login_req("admin", "secret"), 1_000);
        assert!(matches!(result, Err(AuthError::FeatureDisabled)));
    }

    #[test]
    fn test_set_cookie_header_is_unencoded() {
        let state = AuthState::new(test_config());
        let token = state.login(&login_req("admin", "secret"), 1_000).unwrap();
        let [(name, value)] = set_cookie_header(&state.session_cookie(&token));

        assert_eq!(name, header::SET_COOKIE);
        assert!(value.starts_with(&format!("dkron_ui_session={}", token.to_cookie_value())));
        assert!(value.starts_with("dkron_ui_session=admin:4600:"));
        assert!(!value.contains('%'));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=3600"));
    }

    #[test]
    fn test_session_cookie_value_reads_raw_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; dkron_ui_session=admin:100:q+/w=".parse().unwrap(),
        );
        assert_eq!(
            session_cookie_value(&headers).as_deref(),
            Some("admin:100:q+/w=")
        );
    }

    #[test]
    fn test_session_cookie_value_does_not_percent_decode() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "dkron_ui_session=admin%3A100%3Asig".parse().unwrap(),
        );
        let value = session_cookie_value(&headers);
        assert_eq!(value.as_deref(), Some("admin%3A100%3Asig"));

        let signer = SessionSigner::new("s");
        assert!(check_cookie(&signer, value.as_deref(), 0).is_err());
    }

    #[test]
    fn test_session_cookie_value_missing() {
        assert_eq!(session_cookie_value(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let state = AuthState::new(test_config());
        let token = state.login(&login_req("admin", "secret"), 1_000).unwrap();
        let cookie = state.session_cookie(&token);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), token.to_cookie_value());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(
            cookie.max_age(),
            Some(cookie::time::Duration::seconds(3600))
        );
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = AuthState::cleared_session_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            AuthError::MalformedRequest("eof".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::FeatureDisabled.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );

        let challenge = AuthError::InvalidOrExpiredSession {
            target: "/ui/".into(),
        }
        .into_response();
        assert_eq!(challenge.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            challenge.headers()["content-type"],
            "text/html; charset=utf-8"
        );
    }
}
