//! Dashboard Bootstrap
//!
//! Fills the dashboard index template with job counts and the current leader.
//! Both come from external sources; a failing source is logged and degrades to
//! zero counts or the "no leader" sentinel, never to a failed request.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;
use tracing::error;

/// Leader name shown when the leader lookup fails
pub const NO_LEADER: &str = "no leader";

/// Relative URL of the agent REST API, as seen from `/ui/`
pub const API_URL: &str = "../v1/";

const INDEX_TEMPLATE: &str = "index.html";

/// Failures from the external data sources
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("job store query failed: {0}")]
    Jobs(String),

    #[error("leader lookup failed: {0}")]
    Leader(String),
}

/// The slice of a job the dashboard needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    /// Last execution status; empty when the job never ran
    #[serde(default)]
    pub status: String,
}

impl JobSummary {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

/// Source of the current job list
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn jobs(&self) -> Result<Vec<JobSummary>, BackendError>;
}

/// Source of the current cluster leader
#[async_trait]
pub trait LeaderSource: Send + Sync {
    async fn leader_name(&self) -> Result<String, BackendError>;
}

/// In-memory job list
#[derive(Debug, Default)]
pub struct MemoryJobs {
    jobs: RwLock<Vec<JobSummary>>,
}

impl MemoryJobs {
    pub fn new(jobs: Vec<JobSummary>) -> Self {
        Self {
            jobs: RwLock::new(jobs),
        }
    }

    /// Replace the job list
    pub fn set(&self, jobs: Vec<JobSummary>) {
        *self.jobs.write() = jobs;
    }
}

#[async_trait]
impl JobSource for MemoryJobs {
    async fn jobs(&self) -> Result<Vec<JobSummary>, BackendError> {
        Ok(self.jobs.read().clone())
    }
}

/// Fixed leader name; `None` behaves like a cluster without a leader
#[derive(Debug, Clone, Default)]
pub struct StaticLeader(pub Option<String>);

#[async_trait]
impl LeaderSource for StaticLeader {
    async fn leader_name(&self) -> Result<String, BackendError> {
        self.0
            .clone()
            .ok_or_else(|| BackendError::Leader("no cluster leader elected".to_string()))
    }
}

/// Job counts by last execution status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Jobs with an empty status
    pub untriggered: usize,
}

impl JobCounts {
    /// Tally jobs. Statuses other than `success`, `failed` and empty only
    /// count towards the total.
    pub fn tally(jobs: &[JobSummary]) -> Self {
        let mut counts = Self {
            total: jobs.len(),
            ..Default::default()
        };

        for job in jobs {
            match job.status.as_str() {
                "success" => counts.successful += 1,
                "failed" => counts.failed += 1,
                "" => counts.untriggered += 1,
                _ => {}
            }
        }

        counts
    }
}

/// Feature flags surfaced to the front end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFeatures {
    pub acl_enabled: bool,
    pub auth_enabled: bool,
    pub session_enabled: bool,
}

/// Everything the index template consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardVars {
    pub leader: String,
    pub counts: JobCounts,
    pub features: UiFeatures,
}

impl DashboardVars {
    /// Query both sources. Failures are logged and degrade the affected value.
    pub async fn collect(
        jobs: &dyn JobSource,
        leader: &dyn LeaderSource,
        features: UiFeatures,
    ) -> Self {
        let counts = match jobs.jobs().await {
            Ok(jobs) => JobCounts::tally(&jobs),
            Err(e) => {
                error!(error = %e, "Failed to list jobs for dashboard");
                JobCounts::default()
            }
        };

        let leader = match leader.leader_name().await {
            Ok(name) => name,
            Err(e) => {
                error!(error = %e, "Failed to look up leader for dashboard");
                NO_LEADER.to_string()
            }
        };

        Self {
            leader,
            counts,
            features,
        }
    }

    fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("DKRON_API_URL", API_URL);
        context.insert("DKRON_LEADER", &self.leader);
        context.insert("DKRON_TOTAL_JOBS", &self.counts.total);
        context.insert("DKRON_SUCCESSFUL_JOBS", &self.counts.successful);
        context.insert("DKRON_FAILED_JOBS", &self.counts.failed);
        context.insert("DKRON_UNTRIGGERED_JOBS", &self.counts.untriggered);
        context.insert("DKRON_ACL_ENABLED", &self.features.acl_enabled);
        context.insert("DKRON_UI_AUTH_ENABLED", &self.features.auth_enabled);
        context.insert("DKRON_UI_SESSION_ENABLED", &self.features.session_enabled);
        context
    }
}

/// Parsed dashboard index template
#[derive(Debug, Clone)]
pub struct IndexTemplate {
    tera: Tera,
}

impl IndexTemplate {
    /// Parse the index source once at startup
    pub fn parse(source: &str) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(INDEX_TEMPLATE, source)?;
        Ok(Self { tera })
    }

    pub fn render(&self, vars: &DashboardVars) -> Result<String, tera::Error> {
        self.tera.render(INDEX_TEMPLATE, &vars.context())
    }
}
