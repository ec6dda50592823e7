//! Dashboard Configuration
//!
//! Read once from the environment at startup and never mutated afterwards.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::dashboard::session::effective_ttl;

/// UI server configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Bind address (default: 127.0.0.1)
    pub bind_addr: IpAddr,
    /// Port number (default: 8080)
    pub port: u16,
    /// Enable request logging
    pub log_requests: bool,
    /// Whether the agent enforces ACLs (surfaced to the front end only)
    pub acl_enabled: bool,
    /// UI authentication settings
    pub auth: UiAuthConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            log_requests: true,
            acl_enabled: false,
            auth: UiAuthConfig::default(),
        }
    }
}

/// Static credentials and session parameters
#[derive(Clone, Default)]
pub struct UiAuthConfig {
    /// UI authentication enabled
    pub enabled: bool,
    /// Cookie session login enabled
    pub session_enabled: bool,
    pub username: String,
    pub password: String,
    /// HMAC key for session cookies
    pub session_secret: String,
    /// Session lifetime in seconds; `<= 0` selects the one hour default
    pub session_ttl_secs: i64,
}

impl std::fmt::Debug for UiAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiAuthConfig")
            .field("enabled", &self.enabled)
            .field("session_enabled", &self.session_enabled)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

impl UiAuthConfig {
    /// The session gate and `GET /login` are only installed when both flags are set
    pub fn gate_enabled(&self) -> bool {
        self.enabled && self.session_enabled
    }

    /// TTL actually applied to new sessions
    pub fn effective_ttl_secs(&self) -> i64 {
        effective_ttl(self.session_ttl_secs)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| v == "true" || v == "1")
}

impl DashboardConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DKRON_UI_BIND_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.bind_addr = parsed;
            }
        }

        if let Ok(port) = std::env::var("DKRON_UI_PORT") {
            if let Ok(parsed) = port.parse() {
                config.port = parsed;
            }
        }

        if let Some(val) = env_flag("DKRON_UI_LOG_REQUESTS") {
            config.log_requests = val;
        }

        if let Some(val) = env_flag("DKRON_ACL_ENABLED") {
            config.acl_enabled = val;
        }

        let auth = &mut config.auth;
        auth.enabled = env_flag("DKRON_UI_AUTH_ENABLED").unwrap_or(false);
        auth.session_enabled = env_flag("DKRON_UI_SESSION_ENABLED").unwrap_or(false);
        auth.username = std::env::var("DKRON_UI_AUTH_USERNAME").unwrap_or_default();
        auth.password = std::env::var("DKRON_UI_AUTH_PASSWORD").unwrap_or_default();
        auth.session_secret = std::env::var("DKRON_UI_SESSION_SECRET").unwrap_or_default();
        auth.session_ttl_secs = std::env::var("DKRON_UI_SESSION_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        if auth.session_enabled && auth.session_secret.is_empty() {
            tracing::warn!(
                "No UI session secret configured - using random secret, sessions will not survive restarts"
            );
            auth.session_secret = random_secret();
        }

        if auth.gate_enabled() && auth.username.is_empty() {
            tracing::warn!("UI auth enabled without DKRON_UI_AUTH_USERNAME - login accepts an empty username");
        }

        if !config.is_localhost() && !config.auth.gate_enabled() {
            tracing::warn!(
                "Dashboard binding to {} without session authentication",
                config.bind_addr
            );
        }

        config
    }

    /// Check if bound to localhost only
    pub fn is_localhost(&self) -> bool {
        self.bind_addr.is_loopback()
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Get the base URL for this server
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.bind_addr, self.port)
    }
}

/// Process-local fallback secret (development only)
fn random_secret() -> String {
    (0..64)
        .map(|_| {
            let idx = rand::random::<usize>() % 62;
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789"[idx] as char
        })
        .collect()
}
