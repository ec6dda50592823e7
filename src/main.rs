//! Dkron UI - Entry Point
//!
//! Runs the dashboard server with configuration from the environment.

use dkron_ui::{DashboardConfig, MemoryJobs, StaticLeader, UiServer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let help_mode = std::env::args().any(|a| a == "--help" || a == "-h");
    if help_mode {
        println!("Dkron UI v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: dkron-ui [--help]");
        println!();
        println!("Environment variables:");
        println!("  DKRON_UI_BIND_ADDR        Bind address (default: 127.0.0.1)");
        println!("  DKRON_UI_PORT             Port (default: 8080)");
        println!("  DKRON_UI_AUTH_ENABLED     Enable UI authentication");
        println!("  DKRON_UI_SESSION_ENABLED  Enable cookie session login");
        println!("  DKRON_UI_AUTH_USERNAME    Login username");
        println!("  DKRON_UI_AUTH_PASSWORD    Login password");
        println!("  DKRON_UI_SESSION_SECRET   Session signing secret");
        println!("  DKRON_UI_SESSION_TTL      Session lifetime in seconds (default: 3600)");
        println!("  DKRON_LEADER_NAME         Leader name shown on the dashboard");
        println!("  DKRON_UI_LOG_JSON         Log as JSON to stderr");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let json_logs = std::env::var("DKRON_UI_LOG_JSON")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    if json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("Dkron UI v{}", env!("CARGO_PKG_VERSION"));

    let config = DashboardConfig::from_env();
    let jobs = Arc::new(MemoryJobs::default());
    let leader = Arc::new(StaticLeader(std::env::var("DKRON_LEADER_NAME").ok()));

    let server = UiServer::new(config, jobs, leader)?;
    server.run().await
}
