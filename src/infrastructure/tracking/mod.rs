//! Typed repository over the asset-tracking platform

pub mod http;

use crate::domain::Location;
use async_trait::async_trait;
use uuid::Uuid;

pub use http::FtrackApi;

/// Asset-tracking platform errors
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("asset-tracking request failed: {0}")]
    Request(String),
    #[error("asset-tracking returned malformed {kind} record: {reason}")]
    MalformedRecord { kind: &'static str, reason: String },
}

impl From<reqwest::Error> for TrackingError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Read access to locations and component resource identifiers, plus the
/// identity the integration acts as
#[async_trait]
pub trait AssetTracking: Send + Sync {
    /// Look up a location record by id
    async fn location(&self, id: Uuid) -> Result<Option<Location>, TrackingError>;

    /// Look up a location record by its unique name
    async fn location_by_name(&self, name: &str) -> Result<Option<Location>, TrackingError>;

    /// Return the named location, creating it when absent
    async fn ensure_location(&self, location: Location) -> Result<Location, TrackingError>;

    /// Resolve a component's resource identifier (relative path) under a
    /// location. `None` when the component is not registered there.
    async fn resource_identifier(
        &self,
        location_id: Uuid,
        component_id: Uuid,
    ) -> Result<Option<String>, TrackingError>;

    /// Server URL, recorded in job metadata
    fn server_url(&self) -> &str;

    /// Acting API user, recorded in job metadata
    fn api_user(&self) -> &str;
}
