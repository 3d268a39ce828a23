//! Synchronization coordinator
//!
//! Consumes "component added to location" events and reconciles them into
//! transfer-service jobs: one job per source/destination pair and calendar
//! day, tasks appended as components arrive. The coordinator owns no
//! persistent state; both platforms hold all durable records.

use crate::domain::{
    job_code, Client, JobMetadata, Location, NewJob, NewTask, Share, TaskSource,
};
use crate::infrastructure::events::{Event, EventBus};
use crate::infrastructure::tracking::{AssetTracking, TrackingError};
use crate::infrastructure::transfer::{SettingScope, TransferError, TransferService};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Setting key holding the destination location id
const SETTING_UPLOAD_LOCATION: &str = "upload_location";
/// Setting key holding the opaque destination transfer specifier
const SETTING_UPLOAD_IDENT: &str = "upload_ident";

/// Reconciliation failures. None of these ever reach the event dispatcher;
/// the outer handler logs and drops them.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("component {component_id} is not registered at location {location_id}")]
    ComponentNotFound {
        component_id: Uuid,
        location_id: Uuid,
    },
    #[error("destination location {location_id} does not exist")]
    DestinationNotFound { location_id: Uuid },
    #[error("setting {0} is not configured for this location")]
    SettingMissing(&'static str),
    #[error("setting {name} holds {value:?}, expected a location id")]
    SettingInvalid { name: &'static str, value: String },
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

/// What a reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No destination configured for the source location; nothing queued.
    /// Intentional: not every staging write is meant to propagate.
    NoDestination,
    /// A new job was created carrying the first task
    Created { job_id: String, job_code: String },
    /// A task was appended to the day's existing job
    Appended { job_id: String, job_code: String },
}

/// Identities resolved at startup and bound to one coordinator instance
#[derive(Debug, Clone)]
pub struct SyncBinding {
    /// The staging location this coordinator reacts for
    pub location: Location,
    /// Local transfer agent
    pub client: Client,
    /// Share the staging root lives on
    pub share: Share,
}

/// Reactive reconciler between the asset-tracking platform and the
/// transfer service
pub struct SyncCoordinator {
    binding: SyncBinding,
    tracking: Arc<dyn AssetTracking>,
    transfer: Arc<dyn TransferService>,
    events: Arc<EventBus>,

    /// Per-job-code serialization tokens guarding find-or-create
    job_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    running: AtomicBool,
}

impl SyncCoordinator {
    pub fn new(
        binding: SyncBinding,
        tracking: Arc<dyn AssetTracking>,
        transfer: Arc<dyn TransferService>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            binding,
            tracking,
            transfer,
            events,
            job_locks: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn location(&self) -> &Location {
        &self.binding.location
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to the event bus and dispatch until shutdown
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync coordinator already started");
            return;
        }

        let coordinator = self.clone();
        let mut rx = self.events.subscribe();

        tokio::spawn(async move {
            info!(
                location = %coordinator.binding.location.name,
                "Sync coordinator listening for component events"
            );

            loop {
                match rx.recv().await {
                    Ok(Event::ComponentAdded {
                        component_id,
                        location_id,
                    }) if location_id == coordinator.binding.location.id => {
                        coordinator.handle(component_id).await;
                    }
                    Ok(Event::CoreShutdown) => break,
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Sync coordinator lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }

                if !coordinator.running.load(Ordering::SeqCst) {
                    break;
                }
            }

            coordinator.running.store(false, Ordering::SeqCst);
            info!("Sync coordinator stopped");
        });
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Handle one component-added event.
    ///
    /// Thin adapter over [`Self::reconcile`]: any failure is logged with
    /// full context and swallowed. One lost sync trigger is preferable to
    /// blocking or crashing the event-processing path, so nothing here ever
    /// propagates to the dispatch loop.
    #[instrument(skip(self), fields(location = %self.binding.location.name))]
    pub async fn handle(&self, component_id: Uuid) {
        let today = Local::now().date_naive();
        match self.reconcile(component_id, today).await {
            Ok(SyncOutcome::NoDestination) => {
                warn!(
                    %component_id,
                    "No upload destination configured for location; skipping"
                );
            }
            Ok(SyncOutcome::Created { job_id, job_code }) => {
                info!(%component_id, %job_id, %job_code, "Created sync job");
                self.events.emit(Event::SyncQueued {
                    job_id,
                    job_code,
                    created: true,
                });
            }
            Ok(SyncOutcome::Appended { job_id, job_code }) => {
                info!(%component_id, %job_id, %job_code, "Appended task to sync job");
                self.events.emit(Event::SyncQueued {
                    job_id,
                    job_code,
                    created: false,
                });
            }
            Err(e) => {
                error!(
                    %component_id,
                    location_id = %self.binding.location.id,
                    error = %e,
                    "Failed to queue sync for component; event dropped"
                );
            }
        }
    }

    /// Reconcile one component into the day's transfer job.
    ///
    /// The date is a parameter so tests can drive the day boundary; the
    /// event path always passes today in local time.
    pub async fn reconcile(
        &self,
        component_id: Uuid,
        date: NaiveDate,
    ) -> Result<SyncOutcome, SyncError> {
        let source = &self.binding.location;

        let resource_identifier = self
            .tracking
            .resource_identifier(source.id, component_id)
            .await?
            .ok_or(SyncError::ComponentNotFound {
                component_id,
                location_id: source.id,
            })?;

        let scope = SettingScope::for_location(source.id);

        let Some(raw_destination) = self
            .transfer
            .get_setting(SETTING_UPLOAD_LOCATION, &scope)
            .await?
        else {
            return Ok(SyncOutcome::NoDestination);
        };

        let destination_id: Uuid =
            raw_destination
                .parse()
                .map_err(|_| SyncError::SettingInvalid {
                    name: SETTING_UPLOAD_LOCATION,
                    value: raw_destination,
                })?;

        let destination = self
            .tracking
            .location(destination_id)
            .await?
            .ok_or(SyncError::DestinationNotFound {
                location_id: destination_id,
            })?;

        let destination_ident = self
            .transfer
            .get_setting(SETTING_UPLOAD_IDENT, &scope)
            .await?
            .ok_or(SyncError::SettingMissing(SETTING_UPLOAD_IDENT))?;

        let code = job_code(&source.name, &destination.name, date);
        let task = NewTask {
            source: TaskSource {
                client_id: self.binding.client.id.clone(),
                share_code: self.binding.share.code.clone(),
                path: resource_identifier,
            },
            destination: destination_ident,
            component_id,
        };

        // Two concurrent handlers can both observe "no job" and both create
        // one; the service does not enforce code uniqueness atomically, so
        // find-or-create is serialized per derived code within this process.
        let lock = self.job_lock(&code).await;
        let _guard = lock.lock().await;

        match self.transfer.find_job_by_code(&code).await? {
            Some(job) => {
                debug!(job_id = %job.id, %code, "Appending to existing job");
                self.transfer.add_tasks(&job.id, vec![task]).await?;
                Ok(SyncOutcome::Appended {
                    job_id: job.id,
                    job_code: code,
                })
            }
            None => {
                debug!(%code, "No job for this pair today, creating one");
                let job = self
                    .transfer
                    .create_job(NewJob {
                        code: code.clone(),
                        mirror: true,
                        metadata: self.job_metadata(&destination),
                        tasks: vec![task],
                    })
                    .await?;
                Ok(SyncOutcome::Created {
                    job_id: job.id,
                    job_code: code,
                })
            }
        }
    }

    fn job_metadata(&self, destination: &Location) -> JobMetadata {
        let source = &self.binding.location;
        JobMetadata {
            ftrack_server_url: self.tracking.server_url().to_string(),
            source_location_id: source.id,
            source_location_name: source.name.clone(),
            destination_location_id: destination.id,
            destination_location_name: destination.name.clone(),
            user: self.tracking.api_user().to_string(),
        }
    }

    /// Fetch or create the serialization token for a job code, pruning
    /// tokens nobody holds so the map does not grow by one entry per day.
    async fn job_lock(&self, code: &str) -> Arc<Mutex<()>> {
        let mut locks = self.job_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(code.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientKind, JobRecord, TransferUser};
    use async_trait::async_trait;

    struct StaticTracking {
        resource: Option<String>,
        destination: Option<Location>,
    }

    #[async_trait]
    impl AssetTracking for StaticTracking {
        async fn location(&self, _id: Uuid) -> Result<Option<Location>, TrackingError> {
            Ok(self.destination.clone())
        }

        async fn location_by_name(&self, _name: &str) -> Result<Option<Location>, TrackingError> {
            Ok(None)
        }

        async fn ensure_location(&self, location: Location) -> Result<Location, TrackingError> {
            Ok(location)
        }

        async fn resource_identifier(
            &self,
            _location_id: Uuid,
            _component_id: Uuid,
        ) -> Result<Option<String>, TrackingError> {
            Ok(self.resource.clone())
        }

        fn server_url(&self) -> &str {
            "https://acme.ftrackapp.com"
        }

        fn api_user(&self) -> &str {
            "alice@acme.com"
        }
    }

    /// Transfer service whose every call fails
    struct BrokenTransfer;

    #[async_trait]
    impl TransferService for BrokenTransfer {
        async fn find_user(&self, _: &str) -> Result<Option<TransferUser>, TransferError> {
            Err(TransferError::Request("down".into()))
        }

        async fn clients_for_user(&self, _: &str) -> Result<Vec<Client>, TransferError> {
            Err(TransferError::Request("down".into()))
        }

        async fn default_share(&self) -> Result<Option<Share>, TransferError> {
            Err(TransferError::Request("down".into()))
        }

        async fn find_job_by_code(&self, _: &str) -> Result<Option<JobRecord>, TransferError> {
            Err(TransferError::Request("down".into()))
        }

        async fn get_setting(
            &self,
            _: &str,
            _: &SettingScope,
        ) -> Result<Option<String>, TransferError> {
            Err(TransferError::Request("down".into()))
        }

        async fn create_job(&self, _: NewJob) -> Result<JobRecord, TransferError> {
            Err(TransferError::Request("down".into()))
        }

        async fn add_tasks(&self, _: &str, _: Vec<NewTask>) -> Result<(), TransferError> {
            Err(TransferError::Request("down".into()))
        }
    }

    fn binding() -> SyncBinding {
        SyncBinding {
            location: Location::staging("alice", "laptop", "/mnt/staging"),
            client: Client {
                id: "c1".into(),
                code: "laptop".into(),
                host_ids: vec![],
                kind: ClientKind::Workstation,
                user_id: "u1".into(),
            },
            share: Share {
                id: "s1".into(),
                code: "projects".into(),
                default: true,
            },
        }
    }

    fn coordinator(transfer: Arc<dyn TransferService>) -> SyncCoordinator {
        SyncCoordinator::new(
            binding(),
            Arc::new(StaticTracking {
                resource: Some("shot010/plate.exr".into()),
                destination: None,
            }),
            transfer,
            Arc::new(EventBus::default()),
        )
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn handle_swallows_remote_failures() {
        let coordinator = coordinator(Arc::new(BrokenTransfer));
        // Must return normally; a panic or propagated error fails the test.
        coordinator.handle(Uuid::new_v4()).await;
        assert!(logs_contain("Failed to queue sync for component"));
    }

    #[tokio::test]
    async fn reconcile_surfaces_remote_failures_internally() {
        let coordinator = coordinator(Arc::new(BrokenTransfer));
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = coordinator.reconcile(Uuid::new_v4(), date).await.unwrap_err();
        assert!(matches!(err, SyncError::Transfer(_)));
    }

    #[tokio::test]
    async fn job_locks_are_pruned_once_released() {
        let coordinator = coordinator(Arc::new(BrokenTransfer));

        {
            let _lock = coordinator.job_lock("a > b ftrack sync 24.03.01").await;
            assert_eq!(coordinator.job_locks.lock().await.len(), 1);
        }

        // The next acquisition prunes the released entry before inserting.
        let _other = coordinator.job_lock("a > b ftrack sync 24.03.02").await;
        let locks = coordinator.job_locks.lock().await;
        assert_eq!(locks.len(), 1);
        assert!(locks.contains_key("a > b ftrack sync 24.03.02"));
    }
}
