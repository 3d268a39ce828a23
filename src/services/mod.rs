//! Background services management

pub mod sync_coordinator;

use std::sync::Arc;
use tracing::info;

pub use sync_coordinator::{SyncBinding, SyncCoordinator, SyncError, SyncOutcome};

/// Container for the integration's background services
pub struct Services {
    /// The event-driven job/task reconciler
    pub sync_coordinator: Arc<SyncCoordinator>,
}

impl Services {
    pub fn new(sync_coordinator: Arc<SyncCoordinator>) -> Self {
        info!("Initializing background services");
        Self { sync_coordinator }
    }

    /// Start all services
    pub fn start_all(&self) {
        info!("Starting background services");
        self.sync_coordinator.start();
    }

    /// Stop all services gracefully
    pub fn stop_all(&self) {
        info!("Stopping background services");
        self.sync_coordinator.stop();
    }
}
