//! HTTP client for the ftrack server API
//!
//! The server exposes a single endpoint taking a batch of operations;
//! we only ever send one operation per request.

use super::{AssetTracking, TrackingError};
use crate::domain::Location;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

/// Request configuration for the ftrack server API
pub struct FtrackApi {
    client: reqwest::Client,
    server_url: String,
    api_user: String,
    api_key: String,
}

impl FtrackApi {
    pub fn new(
        server_url: impl Into<String>,
        api_user: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            api_user: api_user.into(),
            api_key: api_key.into(),
        }
    }

    /// Send one operation and return its `data` payload
    async fn call(&self, operation: serde_json::Value) -> Result<serde_json::Value, TrackingError> {
        debug!(action = %operation["action"], "Calling asset-tracking API");

        let mut batch: Vec<serde_json::Value> = self
            .client
            .post(format!("{}/api", self.server_url))
            .header("ftrack-user", &self.api_user)
            .header("ftrack-api-key", &self.api_key)
            .json(&json!([operation]))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if batch.is_empty() {
            return Err(TrackingError::Request(
                "empty response batch from server".to_string(),
            ));
        }
        Ok(batch.remove(0))
    }

    async fn query_locations(&self, expression: String) -> Result<Vec<Location>, TrackingError> {
        #[derive(Deserialize)]
        struct WireLocation {
            id: Uuid,
            name: String,
            #[serde(default)]
            description: String,
            #[serde(default)]
            priority: i64,
        }

        let result = self
            .call(json!({ "action": "query", "expression": expression }))
            .await?;

        let records: Vec<WireLocation> = serde_json::from_value(result["data"].clone())
            .map_err(|e| TrackingError::MalformedRecord {
                kind: "Location",
                reason: e.to_string(),
            })?;

        Ok(records
            .into_iter()
            .map(|wire| Location {
                id: wire.id,
                name: wire.name,
                description: wire.description,
                priority: wire.priority,
            })
            .collect())
    }
}

#[async_trait]
impl AssetTracking for FtrackApi {
    async fn location(&self, id: Uuid) -> Result<Option<Location>, TrackingError> {
        let expression = format!(
            "select id, name, description, priority from Location where id is \"{}\"",
            id
        );
        Ok(self.query_locations(expression).await?.into_iter().next())
    }

    async fn location_by_name(&self, name: &str) -> Result<Option<Location>, TrackingError> {
        let expression = format!(
            "select id, name, description, priority from Location where name is \"{}\"",
            name.replace('"', "")
        );
        Ok(self.query_locations(expression).await?.into_iter().next())
    }

    async fn ensure_location(&self, location: Location) -> Result<Location, TrackingError> {
        if let Some(existing) = self.location_by_name(&location.name).await? {
            return Ok(existing);
        }

        self.call(json!({
            "action": "create",
            "entity_type": "Location",
            "entity_data": {
                "id": location.id,
                "name": location.name,
                "description": location.description,
            },
        }))
        .await?;

        Ok(location)
    }

    async fn resource_identifier(
        &self,
        location_id: Uuid,
        component_id: Uuid,
    ) -> Result<Option<String>, TrackingError> {
        #[derive(Deserialize)]
        struct WireComponentLocation {
            resource_identifier: String,
        }

        let expression = format!(
            "select resource_identifier from ComponentLocation \
             where component_id is \"{}\" and location_id is \"{}\"",
            component_id, location_id
        );

        let result = self
            .call(json!({ "action": "query", "expression": expression }))
            .await?;

        let records: Vec<WireComponentLocation> = serde_json::from_value(result["data"].clone())
            .map_err(|e| TrackingError::MalformedRecord {
                kind: "ComponentLocation",
                reason: e.to_string(),
            })?;

        Ok(records.into_iter().next().map(|r| r.resource_identifier))
    }

    fn server_url(&self) -> &str {
        &self.server_url
    }

    fn api_user(&self) -> &str {
        &self.api_user
    }
}
