//! Typed repository over the transfer service
//!
//! The service itself speaks a schema-less textual query language; the
//! coordinator only ever goes through this trait so its logic stays
//! testable against an in-memory fake.

pub mod http;
pub mod query;

use crate::domain::{Client, JobRecord, NewJob, NewTask, Share, TransferUser};
use async_trait::async_trait;
use uuid::Uuid;

pub use http::AccsynApi;

/// Transfer-service errors
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transfer service request failed: {0}")]
    Request(String),
    #[error("transfer service returned malformed {kind} record: {reason}")]
    MalformedRecord { kind: &'static str, reason: String },
}

impl From<reqwest::Error> for TransferError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Scope for keyed settings lookups
#[derive(Debug, Clone)]
pub struct SettingScope {
    /// Integration name the setting is registered under
    pub integration: &'static str,
    /// Asset-tracking location the setting applies to
    pub location_id: Uuid,
}

impl SettingScope {
    pub fn for_location(location_id: Uuid) -> Self {
        Self {
            integration: "ftrack",
            location_id,
        }
    }
}

/// Read/write access to the transfer service, one method per record concern
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Look up a user account by code
    async fn find_user(&self, code: &str) -> Result<Option<TransferUser>, TransferError>;

    /// Agents registered for a user that can represent a user machine
    async fn clients_for_user(&self, user_id: &str) -> Result<Vec<Client>, TransferError>;

    /// The workspace default share
    async fn default_share(&self) -> Result<Option<Share>, TransferError>;

    /// Exact-match job lookup by code. The code is the natural key; the
    /// service holds at most one job per code.
    async fn find_job_by_code(&self, code: &str) -> Result<Option<JobRecord>, TransferError>;

    /// Keyed configuration lookup scoped to an integration + location
    async fn get_setting(
        &self,
        name: &str,
        scope: &SettingScope,
    ) -> Result<Option<String>, TransferError>;

    /// Create a job together with its first tasks in a single call
    async fn create_job(&self, job: NewJob) -> Result<JobRecord, TransferError>;

    /// Append tasks to an existing job. Safe to invoke repeatedly with
    /// different tasks against the same job id.
    async fn add_tasks(&self, job_id: &str, tasks: Vec<NewTask>) -> Result<(), TransferError>;
}
