//! Web Dashboard Module
//!
//! Serves the embedded agent dashboard and guards it with stateless
//! signed-cookie sessions.
//!
//! # Security Model
//!
//! - **Auth disabled** (default): every UI route is open
//! - **Auth + session enabled**: `/ui` and `/ui/*` require a valid
//!   `dkron_ui_session` cookie, otherwise a 401 login challenge is rendered
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Dashboard Server                │
//! ├──────────────────────────────────────────────┤
//! │  GET  /           → 303 /ui/ (browsers only) │
//! │  GET  /login      → Minimal login page       │
//! │  POST /ui/login   → Issue session cookie     │
//! │  POST /ui/logout  → Clear session cookie     │
//! │  GET  /ui/*       → [gate] asset or index    │
//! └──────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod server;
pub mod session;
pub mod templates;

pub use auth::{auth_router, session_gate, AuthError, AuthState, LoginRequest, OkResponse};
pub use bootstrap::{
    BackendError, DashboardVars, JobCounts, JobSource, JobSummary, LeaderSource, MemoryJobs,
    StaticLeader, UiFeatures, NO_LEADER,
};
pub use config::{DashboardConfig, UiAuthConfig};
pub use server::{accepts_html, RootOutcome, UiServer};
pub use session::{SessionError, SessionSigner, SessionToken, SESSION_COOKIE};
