//! HTTP client for the accsyn transfer service

use super::query::{query, Expr};
use super::{SettingScope, TransferError, TransferService};
use crate::domain::{Client, ClientKind, JobRecord, NewJob, NewTask, Share, TransferUser, UserRole};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Request configuration for the accsyn workspace API
pub struct AccsynApi {
    client: reqwest::Client,
    api_url: String,
    api_user: String,
    api_key: String,
}

impl AccsynApi {
    /// Create a client for a workspace domain, e.g. `https://acme.accsyn.com`
    pub fn new(domain: impl Into<String>, api_user: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: domain.into().trim_end_matches('/').to_string(),
            api_user: api_user.into(),
            api_key: api_key.into(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/api/v1/{}", self.api_url, path))
            .header("accsyn-api-user", &self.api_user)
            .header("accsyn-api-key", &self.api_key)
    }

    /// Run a query expression and deserialize the result list
    async fn find<T: serde::de::DeserializeOwned>(
        &self,
        expression: String,
    ) -> Result<Vec<T>, TransferError> {
        debug!(expression = %expression, "Querying transfer service");

        #[derive(Deserialize)]
        struct QueryResponse<T> {
            result: Vec<T>,
        }

        let response: QueryResponse<T> = self
            .post("query")
            .json(&json!({ "expression": expression }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.result)
    }

    async fn find_one<T: serde::de::DeserializeOwned>(
        &self,
        expression: String,
    ) -> Result<Option<T>, TransferError> {
        Ok(self.find(expression).await?.into_iter().next())
    }

    async fn create(
        &self,
        entity: &str,
        data: serde_json::Value,
        parent: Option<&str>,
    ) -> Result<serde_json::Value, TransferError> {
        debug!(entity, ?parent, "Creating transfer service record");

        #[derive(Deserialize)]
        struct CreateResponse {
            result: serde_json::Value,
        }

        let mut body = json!({ "entity": entity, "data": data });
        if let Some(parent) = parent {
            body["parent"] = json!(parent);
        }

        let response: CreateResponse = self
            .post("create")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.result)
    }
}

#[derive(Deserialize)]
struct WireUser {
    id: String,
    code: String,
    role: String,
}

impl TryFrom<WireUser> for TransferUser {
    type Error = TransferError;

    fn try_from(wire: WireUser) -> Result<Self, Self::Error> {
        let role = match wire.role.as_str() {
            "admin" => UserRole::Admin,
            "employee" => UserRole::Employee,
            _ => UserRole::Restricted,
        };
        Ok(Self {
            id: wire.id,
            code: wire.code,
            role,
        })
    }
}

#[derive(Deserialize)]
struct WireClient {
    id: String,
    code: String,
    /// Comma-separated hardware identifiers
    #[serde(default)]
    host_id: String,
    #[serde(rename = "type")]
    kind: u8,
    user: String,
}

impl TryFrom<WireClient> for Client {
    type Error = TransferError;

    fn try_from(wire: WireClient) -> Result<Self, Self::Error> {
        let kind =
            ClientKind::try_from(wire.kind).map_err(|reason| TransferError::MalformedRecord {
                kind: "Client",
                reason,
            })?;
        Ok(Self {
            id: wire.id,
            code: wire.code,
            host_ids: wire
                .host_id
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            kind,
            user_id: wire.user,
        })
    }
}

#[derive(Deserialize)]
struct WireShare {
    id: String,
    code: String,
    #[serde(default)]
    default: bool,
}

#[derive(Deserialize)]
struct WireJob {
    id: String,
    code: String,
    #[serde(default)]
    mirror: bool,
    #[serde(default)]
    tasks: usize,
}

fn task_payload(task: &NewTask) -> serde_json::Value {
    json!({
        "source": {
            "client": task.source.client_id,
            "share": task.source.share_code,
            "path": task.source.path,
        },
        "destination": task.destination,
        "metadata": { "component": task.component_id },
    })
}

#[async_trait]
impl TransferService for AccsynApi {
    async fn find_user(&self, code: &str) -> Result<Option<TransferUser>, TransferError> {
        let expression = query("User", &Expr::eq("code", code));
        match self.find_one::<WireUser>(expression).await? {
            Some(wire) => Ok(Some(wire.try_into()?)),
            None => Ok(None),
        }
    }

    async fn clients_for_user(&self, user_id: &str) -> Result<Vec<Client>, TransferError> {
        // User-machine kinds only: workstations (0) and site servers (2).
        let expression = query(
            "Client",
            &Expr::and(vec![
                Expr::or(vec![Expr::eq("type", 0), Expr::eq("type", 2)]),
                Expr::eq("user", user_id),
            ]),
        );
        self.find::<WireClient>(expression)
            .await?
            .into_iter()
            .map(Client::try_from)
            .collect()
    }

    async fn default_share(&self) -> Result<Option<Share>, TransferError> {
        let expression = query("Share", &Expr::eq("default", true));
        Ok(self
            .find_one::<WireShare>(expression)
            .await?
            .map(|wire| Share {
                id: wire.id,
                code: wire.code,
                default: wire.default,
            }))
    }

    async fn find_job_by_code(&self, code: &str) -> Result<Option<JobRecord>, TransferError> {
        let expression = query("Job", &Expr::eq("code", code));
        Ok(self.find_one::<WireJob>(expression).await?.map(|wire| {
            JobRecord {
                id: wire.id,
                code: wire.code,
                mirror: wire.mirror,
                task_count: wire.tasks,
            }
        }))
    }

    async fn get_setting(
        &self,
        name: &str,
        scope: &SettingScope,
    ) -> Result<Option<String>, TransferError> {
        #[derive(Deserialize)]
        struct SettingResponse {
            result: Option<String>,
        }

        let response: SettingResponse = self
            .post("setting")
            .json(&json!({
                "name": name,
                "integration": scope.integration,
                "data": { "location": scope.location_id },
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // An empty string counts as unconfigured.
        Ok(response.result.filter(|v| !v.is_empty()))
    }

    async fn create_job(&self, job: NewJob) -> Result<JobRecord, TransferError> {
        let data = json!({
            "code": job.code,
            "mirror": job.mirror,
            "metadata": job.metadata,
            "tasks": job.tasks.iter().map(task_payload).collect::<Vec<_>>(),
        });
        let result = self.create("job", data, None).await?;
        let wire: WireJob =
            serde_json::from_value(result).map_err(|e| TransferError::MalformedRecord {
                kind: "Job",
                reason: e.to_string(),
            })?;
        Ok(JobRecord {
            id: wire.id,
            code: wire.code,
            mirror: wire.mirror,
            task_count: wire.tasks,
        })
    }

    async fn add_tasks(&self, job_id: &str, tasks: Vec<NewTask>) -> Result<(), TransferError> {
        let data = json!({
            "tasks": tasks.iter().map(task_payload).collect::<Vec<_>>(),
        });
        self.create("task", data, Some(job_id)).await?;
        Ok(())
    }
}
