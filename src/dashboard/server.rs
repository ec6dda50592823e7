//! Dashboard HTTP Server
//!
//! Axum-based server with embedded static files, the session gate, and
//! graceful shutdown.

use crate::dashboard::auth::{auth_router, session_gate, AuthState};
use crate::dashboard::bootstrap::{
    DashboardVars, IndexTemplate, JobSource, LeaderSource, UiFeatures,
};
use crate::dashboard::config::DashboardConfig;
use anyhow::Context as _;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use rust_embed::Embed;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Embedded static files for the dashboard
#[derive(Embed)]
#[folder = "src/dashboard/static/"]
struct StaticAssets;

/// Outcome of `GET /`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOutcome {
    RedirectToUi,
    NotFound,
}

impl RootOutcome {
    pub fn for_headers(headers: &HeaderMap) -> Self {
        if accepts_html(headers) {
            Self::RedirectToUi
        } else {
            Self::NotFound
        }
    }
}

impl IntoResponse for RootOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToUi => Redirect::to("/ui/").into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// Whether the client will take an HTML response.
///
/// A missing or empty `Accept` header counts as accepting anything.
pub fn accepts_html(headers: &HeaderMap) -> bool {
    let mut ranges = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|range| range.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|range| !range.is_empty())
        .peekable();

    if ranges.peek().is_none() {
        return true;
    }

    ranges.any(|range| matches!(range.as_str(), "text/html" | "text/*" | "*/*"))
}

/// State behind the `/ui` routes
pub struct UiState {
    jobs: Arc<dyn JobSource>,
    leader: Arc<dyn LeaderSource>,
    template: IndexTemplate,
    features: UiFeatures,
}

/// Dashboard server
pub struct UiServer {
    config: DashboardConfig,
    auth: Arc<AuthState>,
    ui: Arc<UiState>,
}

impl UiServer {
    /// Create a server over the given job and leader sources
    pub fn new(
        config: DashboardConfig,
        jobs: Arc<dyn JobSource>,
        leader: Arc<dyn LeaderSource>,
    ) -> anyhow::Result<Self> {
        let index = StaticAssets::get("index.html").context("index.html is not embedded")?;
        let source = std::str::from_utf8(&index.data).context("index.html is not UTF-8")?;
        let template = IndexTemplate::parse(source).context("failed to parse index.html")?;

        let features = UiFeatures {
            acl_enabled: config.acl_enabled,
            auth_enabled: config.auth.enabled,
            session_enabled: config.auth.session_enabled,
        };

        Ok(Self {
            auth: Arc::new(AuthState::new(config.auth.clone())),
            ui: Arc::new(UiState {
                jobs,
                leader,
                template,
                features,
            }),
            config,
        })
    }

    /// Build the router with all routes and middleware
    pub fn router(&self) -> Router {
        let mut ui_routes = Router::new()
            .route("/ui", get(index_handler))
            .route("/ui/", get(index_handler))
            // Browser navigation to the POST-only session endpoints lands on
            // the dashboard, behind the same gate.
            .route("/ui/login", get(index_handler))
            .route("/ui/logout", get(index_handler))
            .route("/ui/{*path}", get(asset_handler))
            .with_state(self.ui.clone());

        if self.auth.config.gate_enabled() {
            ui_routes = ui_routes.route_layer(middleware::from_fn_with_state(
                self.auth.clone(),
                session_gate,
            ));
        }

        let mut router = Router::new()
            .route("/", get(root_handler))
            .merge(ui_routes)
            .merge(auth_router(self.auth.clone()));

        if self.config.log_requests {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server and run until shutdown signal
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting dashboard server on {}", addr);

        if self.config.auth.gate_enabled() {
            info!(
                ttl_secs = self.config.auth.effective_ttl_secs(),
                "UI session authentication enabled"
            );
        } else if self.config.is_localhost() {
            info!("Dashboard bound to localhost - UI routes are open");
        } else {
            warn!("Dashboard bound to {} with UI routes open", addr);
        }

        info!("Dashboard available at {}/ui/", self.config.base_url());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Dashboard server shut down gracefully");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}

async fn root_handler(headers: HeaderMap) -> RootOutcome {
    RootOutcome::for_headers(&headers)
}

async fn index_handler(State(ui): State<Arc<UiState>>) -> Response {
    render_index(&ui).await
}

/// Serve an embedded asset, falling back to the rendered index
async fn asset_handler(State(ui): State<Arc<UiState>>, Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    // Security: prevent path traversal
    if path.contains("..") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    if path.is_empty() || path == "index.html" {
        return render_index(&ui).await;
    }

    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();

            (
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
                ],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => render_index(&ui).await,
    }
}

async fn render_index(ui: &UiState) -> Response {
    let vars = DashboardVars::collect(ui.jobs.as_ref(), ui.leader.as_ref(), ui.features).await;

    match ui.template.render(&vars) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render dashboard index");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::bootstrap::{JobSummary, MemoryJobs, StaticLeader};
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request};
    use tower::ServiceExt;

    fn open_server() -> UiServer {
        let jobs = Arc::new(MemoryJobs::new(vec![
            JobSummary::new("a", "success"),
            JobSummary::new("b", "failed"),
            JobSummary::new("c", ""),
        ]));
        let leader = Arc::new(StaticLeader(Some("node-1".to_string())));
        UiServer::new(DashboardConfig::default(), jobs, leader).unwrap()
    }

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_accepts_html() {
        assert!(accepts_html(&HeaderMap::new()));
        assert!(accepts_html(&accept("")));
        assert!(accepts_html(&accept("text/html,application/xhtml+xml;q=0.9")));
        assert!(accepts_html(&accept("*/*")));
        assert!(accepts_html(&accept("text/*;q=0.5")));
        assert!(!accepts_html(&accept("application/json")));
    }

    #[test]
    fn test_root_outcome() {
        assert_eq!(
            RootOutcome::for_headers(&accept("text/html")),
            RootOutcome::RedirectToUi
        );
        assert_eq!(
            RootOutcome::for_headers(&accept("application/json")),
            RootOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_root_redirects_browsers() {
        let app = open_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ACCEPT, "text/html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/ui/");
    }

    #[tokio::test]
    async fn test_root_not_found_for_api_clients() {
        let app = open_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_renders_counts_when_open() {
        let app = open_server().router();

        let response = app
            .oneshot(Request::builder().uri("/ui/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains(r#"data-leader="node-1""#));
        assert!(html.contains(r#"data-total-jobs="3""#));
        assert!(html.contains(r#"data-untriggered-jobs="1""#));
        assert!(html.contains(r#"data-ui-auth-enabled="false""#));
    }

    #[tokio::test]
    async fn test_embedded_asset_served_raw() {
        let app = open_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ui/assets/app.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript"));
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=3600"
        );
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_index() {
        let app = open_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ui/jobs/backup")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("data-leader="));
    }

    #[tokio::test]
    async fn test_path_traversal_blocked() {
        let app = open_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ui/../../etc/passwd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_page_absent_without_gate() {
        let app = open_server().router();

        let response = app
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
