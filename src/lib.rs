//! ftrack ⇄ accsyn staging-location integration
//!
//! Registers a per-user staging location on the asset-tracking platform and
//! queues accsyn transfer jobs whenever tracked files land in it. The
//! coordinator in [`services::sync_coordinator`] is the heart; everything
//! here is startup wiring.

pub mod accessor;
pub mod config;
pub mod domain;
pub mod identity;
pub mod infrastructure;
pub mod services;

use crate::accessor::StagingAccessor;
use crate::config::{ConfigError, IntegrationConfig};
use crate::domain::{Location, Share};
use crate::identity::{check_user_role, resolve_client, IdentityError, MachineIdent};
use crate::infrastructure::events::{Event, EventBus};
use crate::infrastructure::tracking::{AssetTracking, TrackingError};
use crate::infrastructure::transfer::{TransferError, TransferService};
use crate::services::{Services, SyncBinding, SyncCoordinator};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Startup failures. None of these are recoverable; the integration
/// refuses to register the location at all.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error("transfer service has no default share configured")]
    NoDefaultShare,
}

/// The assembled integration: resolved identities, accessor and services
pub struct Core {
    config: IntegrationConfig,
    location: Location,
    share: Share,
    share_root: PathBuf,
    pub events: Arc<EventBus>,
    pub accessor: Arc<StagingAccessor>,
    services: Services,
}

impl Core {
    /// Bootstrap against the process environment
    pub async fn bootstrap_from_env(
        tracking: Arc<dyn AssetTracking>,
        transfer: Arc<dyn TransferService>,
    ) -> Result<Self, BootstrapError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let config = IntegrationConfig::from_map(&vars)?;
        Self::bootstrap(config, &vars, tracking, transfer).await
    }

    /// Resolve identities on both platforms, register the staging location
    /// and start the coordinator.
    pub async fn bootstrap(
        config: IntegrationConfig,
        vars: &HashMap<String, String>,
        tracking: Arc<dyn AssetTracking>,
        transfer: Arc<dyn TransferService>,
    ) -> Result<Self, BootstrapError> {
        info!("Bootstrapping ftrack-accsyn integration");

        // 1. Resolve the acting transfer-service user and gate on role
        let user = transfer
            .find_user(&config.accsyn_api_user)
            .await?
            .ok_or_else(|| IdentityError::NoUser(config.accsyn_api_user.clone()))?;
        check_user_role(&user)?;
        info!(user = %user.code, id = %user.id, "Resolved transfer-service user");

        // 2. Match this machine to one of the user's registered agents
        let ident = MachineIdent::gather()?;
        let clients = transfer.clients_for_user(&user.id).await?;
        let client = resolve_client(&clients, &ident)?.clone();

        // 3. Resolve the default share and its local root
        let share = transfer
            .default_share()
            .await?
            .ok_or(BootstrapError::NoDefaultShare)?;
        let share_root = config::resolve_share_root(vars, &share.root_env_var())?;
        info!(share = %share.code, root = %share_root.display(), "Resolved share root");

        // 4. Ensure the staging location exists on the asset-tracking side
        let desired = Location::staging(
            tracking.api_user(),
            &ident.hostname,
            &share_root.display().to_string(),
        );
        let location = tracking.ensure_location(desired).await?;
        warn!(
            location = %location.name,
            root = %share_root.display(),
            priority = location.priority,
            "Registering staging location"
        );

        // 5. Wire the accessor and coordinator, then start services
        let events = Arc::new(EventBus::default());
        let accessor = Arc::new(StagingAccessor::new(
            location.id,
            share_root.clone(),
            events.clone(),
        ));

        let coordinator = Arc::new(SyncCoordinator::new(
            SyncBinding {
                location: location.clone(),
                client,
                share: share.clone(),
            },
            tracking,
            transfer,
            events.clone(),
        ));
        let services = Services::new(coordinator);
        services.start_all();

        events.emit(Event::CoreStarted);

        Ok(Self {
            config,
            location,
            share,
            share_root,
            events,
            accessor,
            services,
        })
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// The registered staging location
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn share(&self) -> &Share {
        &self.share
    }

    pub fn share_root(&self) -> &PathBuf {
        &self.share_root
    }

    /// Stop services and announce shutdown
    pub fn shutdown(&self) {
        info!("Shutting down ftrack-accsyn integration");
        self.services.stop_all();
        self.events.emit(Event::CoreShutdown);
    }
}
