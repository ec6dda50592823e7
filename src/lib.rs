//! Dkron UI
//!
//! Embedded web dashboard for a Dkron agent, protected by stateless
//! HMAC-signed session cookies.
//!
//! # Features
//!
//! - **Session Signer**: HMAC-SHA256 over `username:expiry`, constant-time verify
//! - **Session Gate**: axum middleware rendering a login challenge on failure
//! - **Login/Logout**: static credentials, cookie issue and clear
//! - **Dashboard Bootstrap**: job counts and leader name injected into the index
//!
//! # Architecture
//!
//! ```text
//! Browser ──► Router ──► Session Gate ──► Assets / Index template
//!               │                              │
//!               ├── /ui/login  (issue cookie)  ├── JobSource
//!               └── /ui/logout (clear cookie)  └── LeaderSource
//! ```

pub mod dashboard;

pub use dashboard::{
    DashboardConfig, JobSource, JobSummary, LeaderSource, MemoryJobs, SessionSigner,
    SessionToken, StaticLeader, UiAuthConfig, UiServer,
};
